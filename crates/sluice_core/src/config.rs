//! Filter configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::DeliveryError;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Selector that matches every element.
pub const WILDCARD_SELECTOR: &str = "*";

/// Binding of one visitor resource to the elements it targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Element name, or `*` for every element.
    pub selector: String,

    /// Name of the visitor resource.
    pub resource: String,

    /// Resource-specific parameters.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

impl ResourceConfig {
    pub fn new(selector: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            resource: resource.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn is_wildcard(&self) -> bool {
        self.selector == WILDCARD_SELECTOR
    }

    /// Returns true if this resource targets elements named `name`.
    pub fn targets(&self, name: &str) -> bool {
        self.is_wildcard() || self.selector == name
    }
}

/// Configuration of a filter run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Profiles the run is targeted at. The first entry is the base profile.
    #[serde(default)]
    pub profiles: Vec<String>,

    /// Content encoding of the input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Global configuration parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,

    /// Visitor resources in dispatch order.
    #[serde(default)]
    pub resources: Vec<ResourceConfig>,

    /// Whether to wrap every visitor in the logging interceptor.
    #[serde(default)]
    pub log_invocations: bool,
}

impl FilterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DeliveryError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            DeliveryError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parses configuration from JSON string with schema validation.
    pub fn from_json(json: &str) -> Result<Self, DeliveryError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DeliveryError::config(format!("Invalid JSON: {}", e)))?;

        let schema = CONFIG_SCHEMA.get_or_init(|| {
            let schema_json: serde_json::Value =
                serde_json::from_str(SCHEMA_JSON).expect("Invalid embedded config schema");
            Validator::new(&schema_json).expect("Invalid config schema compilation")
        });

        if let Err(e) = schema.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(DeliveryError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| DeliveryError::config(format!("Invalid config: {}", e)))
    }
}
