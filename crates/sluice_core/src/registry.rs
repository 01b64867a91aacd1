//! Visitor resolution by resource name.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::context::ProfileSet;
use crate::{
    DeliveryConfig, DeliveryConfigBuilder, DeliveryError, FilterConfig, ResourceConfig, Visitor,
};

/// Creates a visitor for one resource binding.
pub type VisitorFactory =
    Box<dyn Fn(&ResourceConfig) -> Result<Arc<dyn Visitor>, DeliveryError> + Send + Sync>;

/// Named visitor factories.
#[derive(Default)]
pub struct VisitorRegistry {
    factories: BTreeMap<String, VisitorFactory>,
}

impl VisitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory, replacing any factory registered under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ResourceConfig) -> Result<Arc<dyn Visitor>, DeliveryError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Creates the visitor for `resource`.
    pub fn create(&self, resource: &ResourceConfig) -> Result<Arc<dyn Visitor>, DeliveryError> {
        let factory = self.factories.get(&resource.resource).ok_or_else(|| {
            DeliveryError::config(format!("Unknown visitor resource '{}'", resource.resource))
        })?;
        factory(resource)
    }

    /// Resolves every resource of `config` into a delivery configuration builder.
    ///
    /// The first profile of the configuration is the base profile.
    pub fn build_delivery(
        &self,
        config: &FilterConfig,
    ) -> Result<DeliveryConfigBuilder, DeliveryError> {
        let mut builder = DeliveryConfig::builder().log_invocations(config.log_invocations);

        if let Some((base, rest)) = config.profiles.split_first() {
            builder =
                builder.profiles(ProfileSet::new(base.as_str(), rest.iter().map(String::as_str)));
        }
        for (name, value) in &config.parameters {
            builder = builder.parameter(name.as_str(), value.as_str());
        }
        for resource in &config.resources {
            let visitor = self.create(resource)?;
            debug!(
                selector = %resource.selector,
                resource = %resource.resource,
                "bound visitor"
            );
            builder = builder.bind(resource.clone(), visitor);
        }
        Ok(builder)
    }
}
