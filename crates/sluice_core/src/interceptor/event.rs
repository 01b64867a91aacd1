//! Execution event publication.

use super::{Interceptor, Invocation, Next};
use crate::event::{ResourceTargetingEvent, VisitEvent};
use crate::{DeliveryError, ExecutionContext, VisitSequence};

/// Publishes targeting and visit events around an invocation.
///
/// Events are only published when the target declares the invocation's
/// capability. BEFORE sites publish a targeting event before the chain
/// proceeds; every site publishes a visit event once the chain has completed.
/// A failing chain publishes no visit event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventInterceptor;

impl Interceptor for EventInterceptor {
    fn name(&self) -> &str {
        "event"
    }

    fn intercept(
        &self,
        invocation: Invocation<'_>,
        ctx: &mut ExecutionContext,
        next: Next<'_>,
    ) -> Result<(), DeliveryError> {
        let capability = invocation.capability();
        if !next.target().capabilities().contains(capability) {
            return next.proceed(invocation, ctx);
        }

        let fragment = invocation.fragment();
        let resource = next.resource();
        let sequence = capability.sequence();

        if sequence == VisitSequence::Before {
            ctx.notify_targeting(&ResourceTargetingEvent {
                fragment,
                resource,
                capability,
                sequence,
            })?;
        }

        next.proceed(invocation, ctx)?;

        let ctx: &ExecutionContext = ctx;
        ctx.notify_visit(&VisitEvent {
            fragment,
            capability,
            resource,
            sequence,
            context: ctx,
        })
    }
}
