//! Document drivers.
//!
//! A driver walks one document, builds the fragment for every traversal point
//! and calls the site methods of every [`InterceptorChain`] bound to it. The
//! fault policy decides whether a callback fault ends the run.
//!
//! [`InterceptorChain`]: crate::InterceptorChain

mod parallel;
mod stream;
mod tree;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sluice_ast::Document;
use tracing::warn;

use crate::{DeliveryError, ExecutionContext, Fragment};

pub use parallel::{RunOutcome, run_parallel};
pub use stream::StreamFilter;
pub use tree::TreeFilter;

/// Parameter selecting the fault policy. Defaults to `true`.
pub const TERMINATE_ON_VISITOR_EXCEPTION: &str = "terminate.on.visitor.exception";

/// What a driver does after a callback fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Record the fault and abort the run.
    Terminate,
    /// Record the fault and keep dispatching.
    Continue,
}

impl FaultPolicy {
    /// Reads the policy from the context's configuration parameters.
    pub fn from_context(ctx: &ExecutionContext) -> Result<Self, DeliveryError> {
        match ctx.config_parameter(TERMINATE_ON_VISITOR_EXCEPTION) {
            None => Ok(FaultPolicy::Terminate),
            Some(value) if value.trim().eq_ignore_ascii_case("true") => Ok(FaultPolicy::Terminate),
            Some(value) if value.trim().eq_ignore_ascii_case("false") => Ok(FaultPolicy::Continue),
            Some(value) => Err(DeliveryError::config(format!(
                "Invalid value '{}' for parameter '{}'",
                value, TERMINATE_ON_VISITOR_EXCEPTION
            ))),
        }
    }

    /// Applies the policy to the outcome of one callback site.
    pub(crate) fn handle(
        self,
        fragment: Fragment<'_>,
        result: Result<(), DeliveryError>,
        ctx: &mut ExecutionContext,
    ) -> Result<(), DeliveryError> {
        let Err(error) = result else {
            return Ok(());
        };
        let error = Arc::new(error);
        ctx.set_termination_error(Arc::clone(&error));
        match self {
            FaultPolicy::Terminate => Err(DeliveryError::Aborted {
                fragment: fragment.to_string(),
                source: error,
            }),
            FaultPolicy::Continue => {
                warn!(
                    document = ctx.document_source(),
                    fragment = %fragment,
                    "Continuing after visitor fault: {}",
                    error
                );
                Ok(())
            }
        }
    }
}

/// Document representation a driver walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    #[default]
    Stream,
    Tree,
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FilterMode::Stream => "stream",
            FilterMode::Tree => "tree",
        })
    }
}

impl FromStr for FilterMode {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" => Ok(FilterMode::Stream),
            "tree" => Ok(FilterMode::Tree),
            _ => Err(DeliveryError::config(format!("Unknown filter mode '{}'", s))),
        }
    }
}

/// Runs `document` through the driver for `mode`.
///
/// In stream mode the document is replayed as its event sequence.
pub fn filter_document(
    document: &Document,
    mode: FilterMode,
    ctx: &mut ExecutionContext,
) -> Result<(), DeliveryError> {
    match mode {
        FilterMode::Stream => StreamFilter::new().filter(document.events(), ctx),
        FilterMode::Tree => TreeFilter::new().filter(document, ctx),
    }
}
