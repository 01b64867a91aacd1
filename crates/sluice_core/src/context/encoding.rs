//! Content encoding labels.

/// Encoding used when none has been set.
pub const DEFAULT_ENCODING: &str = "UTF-8";

const SUPPORTED_ENCODINGS: &[(&str, &[&str])] = &[
    ("UTF-8", &["utf-8", "utf8", "unicode-1-1-utf-8"]),
    ("UTF-16", &["utf-16", "utf16"]),
    ("UTF-16BE", &["utf-16be", "utf16be"]),
    ("UTF-16LE", &["utf-16le", "utf16le"]),
    ("US-ASCII", &["us-ascii", "ascii"]),
    ("ISO-8859-1", &["iso-8859-1", "iso8859-1", "latin1", "l1"]),
];

/// Returns the canonical name of a supported encoding label.
///
/// Labels are matched case-insensitively after trimming.
pub fn canonical_encoding(label: &str) -> Option<&'static str> {
    let label = label.trim().to_ascii_lowercase();
    SUPPORTED_ENCODINGS
        .iter()
        .find(|(_, aliases)| aliases.contains(&label.as_str()))
        .map(|(canonical, _)| *canonical)
}
