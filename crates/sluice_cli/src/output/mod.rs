//! Output formatting module

use miette::{IntoDiagnostic, Result};
use sluice_core::BeanContext;
use sluice_core::event::RecordedEvent;

use crate::visitors::ElementCounts;

pub fn output_beans(beans: &BeanContext) {
    if beans.is_empty() {
        return;
    }

    println!("\nBeans:");
    for id in beans.ids() {
        match beans.get::<ElementCounts>(id) {
            Some(counts) => {
                let summary: Vec<String> = counts
                    .0
                    .iter()
                    .map(|(name, count)| format!("{}={}", name, count))
                    .collect();
                println!("  {}: {}", id, summary.join(", "));
            }
            None => println!("  {}: <opaque>", id),
        }
    }
}

pub fn output_events(events: &[RecordedEvent]) -> Result<()> {
    println!("\nEvents:");
    println!("{}", serde_json::to_string_pretty(events).into_diagnostic()?);
    Ok(())
}
