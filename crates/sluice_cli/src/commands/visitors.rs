//! Visitors command implementation

use miette::{IntoDiagnostic, Result};
use sluice_core::ResourceConfig;

use crate::visitors::builtin_registry;

pub fn run_visitors() -> Result<()> {
    let registry = builtin_registry();
    for name in registry.names() {
        let visitor = registry
            .create(&ResourceConfig::new("*", name))
            .into_diagnostic()?;
        let capabilities: Vec<&str> = visitor
            .capabilities()
            .iter()
            .map(|capability| capability.as_str())
            .collect();
        println!("{:<16} {}", name, capabilities.join(", "));
    }
    Ok(())
}
