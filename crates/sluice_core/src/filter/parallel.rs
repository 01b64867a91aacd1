//! Parallel document runs.

use std::sync::Arc;

use rayon::prelude::*;
use sluice_ast::Document;
use tracing::warn;

use super::{FilterMode, filter_document};
use crate::{DeliveryConfig, DeliveryError, ExecutionContext};

/// Result of one run started by [`run_parallel`].
#[derive(Debug)]
pub struct RunOutcome {
    /// Position of the document in the input slice.
    pub index: usize,
    pub context: ExecutionContext,
    pub result: Result<(), DeliveryError>,
}

/// Filters every document on the rayon pool.
///
/// All runs share `delivery`; each gets its own [`ExecutionContext`], which
/// `configure` can prepare before the run starts. Outcomes are returned in
/// input order.
pub fn run_parallel<F>(
    documents: &[Document],
    mode: FilterMode,
    delivery: &Arc<DeliveryConfig>,
    configure: F,
) -> Vec<RunOutcome>
where
    F: Fn(usize, &mut ExecutionContext) + Sync,
{
    documents
        .par_iter()
        .enumerate()
        .map(|(index, document)| {
            let mut context = ExecutionContext::new(Arc::clone(delivery));
            configure(index, &mut context);
            let result = filter_document(document, mode, &mut context);
            if let Err(e) = &result {
                warn!("Failed to filter {}: {}", context.document_source(), e);
            }
            RunOutcome {
                index,
                context,
                result,
            }
        })
        .collect()
}
