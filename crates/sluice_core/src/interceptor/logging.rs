//! Invocation logging.

use tracing::{debug_span, trace, warn};

use super::{Interceptor, Invocation, Next};
use crate::{DeliveryError, ExecutionContext};

/// Wraps each invocation in a `tracing` span and logs faults before
/// re-raising them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        "logging"
    }

    fn intercept(
        &self,
        invocation: Invocation<'_>,
        ctx: &mut ExecutionContext,
        next: Next<'_>,
    ) -> Result<(), DeliveryError> {
        let span = debug_span!(
            "invoke",
            visitor = next.target().name(),
            resource = %next.resource().resource,
            capability = %invocation.capability(),
            fragment = %invocation.fragment(),
        );
        let _guard = span.enter();

        let result = next.proceed(invocation, ctx);
        match &result {
            Ok(()) => trace!("completed"),
            Err(e) => warn!(document = ctx.document_source(), "Visitor invocation failed: {}", e),
        }
        result
    }
}
