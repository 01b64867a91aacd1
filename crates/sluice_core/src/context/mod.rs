//! Per-run execution state.
//!
//! An [`ExecutionContext`] is created for one document run and threaded by
//! `&mut` through every visitor callback. It is never shared between runs;
//! the collaborators it references ([`DeliveryConfig`], [`ApplicationContext`])
//! are the only state concurrent runs have in common.

mod application;
mod bean;
mod encoding;
mod profile;

use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{debug, warn};

pub use application::ApplicationContext;
pub use bean::BeanContext;
pub use encoding::{DEFAULT_ENCODING, canonical_encoding};
pub use profile::{DEFAULT_PROFILE, ProfileSet};

use crate::event::{ExecutionEventListener, NoopListener, ResourceTargetingEvent, VisitEvent};
use crate::{DeliveryConfig, DeliveryError, FragmentId, HandlerId, MementoCaretaker, VisitSequence};

/// Document source reported when none has been set.
pub const DEFAULT_DOCUMENT_URI: &str = "urn:sluice:unknowndoc";

/// Output sink of a run.
pub type OutputWriter = Box<dyn Write + Send>;

/// Mutable state of a single document run.
pub struct ExecutionContext {
    document_source: Option<String>,
    delivery: Arc<DeliveryConfig>,
    encoding: &'static str,
    listener: Box<dyn ExecutionEventListener>,
    termination_error: Option<Arc<DeliveryError>>,
    parameters: HashMap<String, String>,
    bean_context: BeanContext,
    writer: Option<OutputWriter>,
    caretaker: MementoCaretaker,
}

impl ExecutionContext {
    /// Creates a context for one run against `delivery`.
    pub fn new(delivery: Arc<DeliveryConfig>) -> Self {
        Self {
            document_source: None,
            delivery,
            encoding: DEFAULT_ENCODING,
            listener: Box::new(NoopListener),
            termination_error: None,
            parameters: HashMap::new(),
            bean_context: BeanContext::new(),
            writer: None,
            caretaker: MementoCaretaker::new(),
        }
    }

    /// Returns the document source URI, or [`DEFAULT_DOCUMENT_URI`] if unset.
    pub fn document_source(&self) -> &str {
        self.document_source
            .as_deref()
            .unwrap_or(DEFAULT_DOCUMENT_URI)
    }

    pub fn set_document_source(&mut self, source: impl Into<String>) {
        self.document_source = Some(source.into());
    }

    pub fn application_context(&self) -> &Arc<ApplicationContext> {
        self.delivery.application_context()
    }

    pub fn target_profiles(&self) -> &ProfileSet {
        self.delivery.profiles()
    }

    pub fn delivery_config(&self) -> &Arc<DeliveryConfig> {
        &self.delivery
    }

    /// Sets the content encoding.
    ///
    /// `None` resets to [`DEFAULT_ENCODING`]. Unsupported labels are rejected
    /// and leave the current encoding in place.
    pub fn set_content_encoding(&mut self, encoding: Option<&str>) -> Result<(), DeliveryError> {
        self.encoding = match encoding {
            None => DEFAULT_ENCODING,
            Some(label) => canonical_encoding(label).ok_or_else(|| {
                DeliveryError::config(format!("Unsupported content encoding '{}'", label))
            })?,
        };
        Ok(())
    }

    /// Returns the canonical name of the content encoding.
    pub fn content_encoding(&self) -> &'static str {
        self.encoding
    }

    /// Replaces the event listener.
    pub fn set_event_listener(&mut self, listener: impl ExecutionEventListener + 'static) {
        self.listener = Box::new(listener);
    }

    pub fn event_listener(&self) -> &dyn ExecutionEventListener {
        &*self.listener
    }

    /// Puts the no-op listener back in the slot.
    pub fn clear_event_listener(&mut self) {
        self.listener = Box::new(NoopListener);
    }

    /// Records the terminal fault of the run.
    ///
    /// Only the first fault is kept. Later calls succeed but are dropped.
    pub fn set_termination_error(&mut self, error: Arc<DeliveryError>) {
        match &self.termination_error {
            Some(first) => debug!(
                first = %first,
                ignored = %error,
                "termination error already recorded"
            ),
            None => self.termination_error = Some(error),
        }
    }

    pub fn termination_error(&self) -> Option<&Arc<DeliveryError>> {
        self.termination_error.as_ref()
    }

    pub fn is_terminated(&self) -> bool {
        self.termination_error.is_some()
    }

    /// Looks up a configuration parameter.
    ///
    /// Values set on this context take precedence over the delivery
    /// configuration's global parameters.
    pub fn config_parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(name)
            .map(String::as_str)
            .or_else(|| self.delivery.parameter(name))
    }

    pub fn config_parameter_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.config_parameter(name).unwrap_or(default)
    }

    /// Overrides a configuration parameter for this run only.
    pub fn set_config_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(name.into(), value.into());
    }

    pub fn bean_context(&self) -> &BeanContext {
        &self.bean_context
    }

    pub fn bean_context_mut(&mut self) -> &mut BeanContext {
        &mut self.bean_context
    }

    /// Replaces the bean context, returning the previous one.
    pub fn set_bean_context(&mut self, beans: BeanContext) -> BeanContext {
        std::mem::replace(&mut self.bean_context, beans)
    }

    /// Installs the output sink.
    ///
    /// The sink belongs to the driver that owns the run. Visitors write to it
    /// through [`writer_mut`](Self::writer_mut) and never install one.
    pub fn set_writer(&mut self, writer: impl Write + Send + 'static) {
        if self.writer.is_some() {
            warn!(document = self.document_source(), "replacing output writer");
        }
        self.writer = Some(Box::new(writer));
    }

    pub fn writer_mut(&mut self) -> Option<&mut OutputWriter> {
        self.writer.as_mut()
    }

    /// Removes the output sink, typically once the run is over.
    pub fn take_writer(&mut self) -> Option<OutputWriter> {
        self.writer.take()
    }

    pub fn memento_caretaker(&self) -> &MementoCaretaker {
        &self.caretaker
    }

    pub fn memento_caretaker_mut(&mut self) -> &mut MementoCaretaker {
        &mut self.caretaker
    }

    /// Runs `f` between a checkpoint and a restore of `handler`'s state.
    ///
    /// The restore happens whether or not `f` succeeds, so nothing `handler`
    /// stashes during `f` outlives the call.
    pub fn speculate<R>(
        &mut self,
        handler: HandlerId,
        fragment: FragmentId,
        sequence: VisitSequence,
        f: impl FnOnce(&mut Self) -> Result<R, DeliveryError>,
    ) -> Result<R, DeliveryError> {
        let memento = self.caretaker.checkpoint(handler, fragment, sequence);
        let result = f(self);
        self.caretaker.restore(&memento);
        result
    }

    /// Publishes a targeting event to the context listener, then to the
    /// delivery configuration's listeners.
    pub fn notify_targeting(
        &self,
        event: &ResourceTargetingEvent<'_>,
    ) -> Result<(), DeliveryError> {
        self.listener
            .on_targeting(event)
            .map_err(DeliveryError::listener)?;
        for listener in self.delivery.listeners() {
            listener
                .on_targeting(event)
                .map_err(DeliveryError::listener)?;
        }
        Ok(())
    }

    /// Publishes a visit event in the same order as targeting events.
    pub fn notify_visit(&self, event: &VisitEvent<'_>) -> Result<(), DeliveryError> {
        self.listener.on_visit(event).map_err(DeliveryError::listener)?;
        for listener in self.delivery.listeners() {
            listener.on_visit(event).map_err(DeliveryError::listener)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("document_source", &self.document_source())
            .field("encoding", &self.encoding)
            .field("termination_error", &self.termination_error)
            .field("parameters", &self.parameters)
            .field("beans", &self.bean_context)
            .field("has_writer", &self.writer.is_some())
            .field("caretaker", &self.caretaker)
            .finish()
    }
}
