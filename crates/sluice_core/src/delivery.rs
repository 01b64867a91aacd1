//! Run-independent delivery configuration.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::context::{ApplicationContext, DEFAULT_PROFILE, ProfileSet};
use crate::event::ExecutionEventListener;
use crate::interceptor::{EventInterceptor, Interceptor, InterceptorChain, LoggingInterceptor};
use crate::{HandlerId, ResourceConfig, Visitor};

/// Binding indices per element name, in registration order.
#[derive(Debug, Default)]
struct SelectorIndex {
    by_name: HashMap<String, Vec<usize>>,
    wildcard: Vec<usize>,
}

impl SelectorIndex {
    fn build(bindings: &[InterceptorChain]) -> Self {
        let mut index = SelectorIndex::default();
        let mut exact: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, chain) in bindings.iter().enumerate() {
            let resource = chain.resource();
            if resource.is_wildcard() {
                index.wildcard.push(i);
            } else {
                exact.entry(resource.selector.as_str()).or_default().push(i);
            }
        }

        // Each named entry merges its exact bindings with the wildcard ones.
        for (name, mut indices) in exact {
            indices.extend_from_slice(&index.wildcard);
            indices.sort_unstable();
            index.by_name.insert(name.to_string(), indices);
        }
        index
    }

    fn lookup(&self, name: &str) -> &[usize] {
        self.by_name
            .get(name)
            .map_or(self.wildcard.as_slice(), Vec::as_slice)
    }
}

/// Visitor bindings and collaborators shared by every run.
///
/// Safe to share between concurrently running contexts. The only lazily
/// computed state, the selector index, is built once behind a [`OnceLock`].
pub struct DeliveryConfig {
    application: Arc<ApplicationContext>,
    profiles: ProfileSet,
    bindings: Vec<InterceptorChain>,
    listeners: Vec<Arc<dyn ExecutionEventListener>>,
    parameters: BTreeMap<String, String>,
    index: OnceLock<SelectorIndex>,
}

impl DeliveryConfig {
    pub fn builder() -> DeliveryConfigBuilder {
        DeliveryConfigBuilder::default()
    }

    pub fn application_context(&self) -> &Arc<ApplicationContext> {
        &self.application
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// All bindings in registration order.
    pub fn bindings(&self) -> &[InterceptorChain] {
        &self.bindings
    }

    /// Listeners notified of every event of every run.
    pub fn listeners(&self) -> &[Arc<dyn ExecutionEventListener>] {
        &self.listeners
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    /// Returns the bindings targeting elements named `name`, in registration order.
    pub fn chains_for<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a InterceptorChain> + use<'a> {
        let indices = self.index().lookup(name);
        indices.iter().map(|&i| &self.bindings[i])
    }

    /// Returns the resource a visitor is bound as.
    pub fn resource_for(&self, handler: HandlerId) -> Option<&ResourceConfig> {
        self.bindings
            .iter()
            .find(|chain| chain.handler_id() == handler)
            .map(InterceptorChain::resource)
    }

    fn index(&self) -> &SelectorIndex {
        self.index.get_or_init(|| {
            let index = SelectorIndex::build(&self.bindings);
            debug!(
                selectors = index.by_name.len(),
                wildcard = index.wildcard.len(),
                "built selector index"
            );
            index
        })
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for DeliveryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryConfig")
            .field("profiles", &self.profiles)
            .field("bindings", &self.bindings)
            .field("listeners", &self.listeners.len())
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Builder for [`DeliveryConfig`].
///
/// Every bound visitor is wrapped in the same interceptor stack: the logging
/// interceptor when enabled, then the event interceptor, then any extra
/// interceptors in the order they were added.
#[derive(Default)]
pub struct DeliveryConfigBuilder {
    application: Option<Arc<ApplicationContext>>,
    profiles: Option<ProfileSet>,
    resources: Vec<(ResourceConfig, Arc<dyn Visitor>)>,
    listeners: Vec<Arc<dyn ExecutionEventListener>>,
    parameters: BTreeMap<String, String>,
    interceptors: Vec<Arc<dyn Interceptor>>,
    log_invocations: bool,
}

impl DeliveryConfigBuilder {
    #[must_use]
    pub fn application(mut self, application: Arc<ApplicationContext>) -> Self {
        self.application = Some(application);
        self
    }

    #[must_use]
    pub fn profiles(mut self, profiles: ProfileSet) -> Self {
        self.profiles = Some(profiles);
        self
    }

    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn listener(mut self, listener: Arc<dyn ExecutionEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    #[must_use]
    pub fn log_invocations(mut self, enabled: bool) -> Self {
        self.log_invocations = enabled;
        self
    }

    /// Adds an interceptor after the built-in ones.
    #[must_use]
    pub fn interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Binds `visitor` as `resource`.
    #[must_use]
    pub fn bind(mut self, resource: ResourceConfig, visitor: Arc<dyn Visitor>) -> Self {
        self.resources.push((resource, visitor));
        self
    }

    /// Binds `visitor` to `selector`, naming the resource after the visitor.
    #[must_use]
    pub fn bind_visitor(self, selector: impl Into<String>, visitor: Arc<dyn Visitor>) -> Self {
        let resource = ResourceConfig::new(selector, visitor.name());
        self.bind(resource, visitor)
    }

    pub fn build(self) -> DeliveryConfig {
        let mut stack: Vec<Arc<dyn Interceptor>> = Vec::with_capacity(self.interceptors.len() + 2);
        if self.log_invocations {
            stack.push(Arc::new(LoggingInterceptor));
        }
        stack.push(Arc::new(EventInterceptor));
        stack.extend(self.interceptors);

        let bindings = self
            .resources
            .into_iter()
            .map(|(resource, visitor)| {
                stack
                    .iter()
                    .fold(InterceptorChain::new(visitor, resource), |chain, interceptor| {
                        chain.with_interceptor(Arc::clone(interceptor))
                    })
            })
            .collect();

        DeliveryConfig {
            application: self.application.unwrap_or_default(),
            profiles: self
                .profiles
                .unwrap_or_else(|| ProfileSet::new(DEFAULT_PROFILE, std::iter::empty::<String>())),
            bindings,
            listeners: self.listeners,
            parameters: self.parameters,
            index: OnceLock::new(),
        }
    }
}
