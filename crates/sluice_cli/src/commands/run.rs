//! Run command implementation

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result, WrapErr};
use sluice_ast::Document;
use sluice_core::event::{EventRecorder, TracingListener};
use sluice_core::filter::{FilterMode, filter_document};
use sluice_core::{ExecutionContext, FilterConfig};
use tracing::info;

use crate::output::{output_beans, output_events};
use crate::visitors::builtin_registry;

pub fn run_filter(
    document: &Path,
    config: Option<&Path>,
    mode: FilterMode,
    events: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => FilterConfig::from_file(path).into_diagnostic()?,
        None => FilterConfig::default(),
    };

    let content = fs::read_to_string(document)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read document {}", document.display()))?;
    let parsed = Document::from_json(&content)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to parse document {}", document.display()))?;

    let delivery = builtin_registry()
        .build_delivery(&config)
        .into_diagnostic()?
        .listener(Arc::new(TracingListener))
        .build();
    info!(
        "Filtering {} in {} mode with {} visitor(s)",
        document.display(),
        mode,
        delivery.bindings().len()
    );

    let mut ctx = ExecutionContext::new(Arc::new(delivery));
    ctx.set_document_source(document.display().to_string());
    ctx.set_content_encoding(config.encoding.as_deref())
        .into_diagnostic()?;
    ctx.set_writer(std::io::stdout());

    let recorder = Arc::new(EventRecorder::new());
    if events {
        ctx.set_event_listener(Arc::clone(&recorder));
    }

    let result = filter_document(&parsed, mode, &mut ctx);

    if let Some(mut writer) = ctx.take_writer() {
        writer.flush().into_diagnostic()?;
    }
    output_beans(ctx.bean_context());
    if events {
        output_events(&recorder.take())?;
    }

    result.into_diagnostic()
}
