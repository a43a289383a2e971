//! Parsing of the `custom.lumigo` section.
//!
//! Keys that steer the wrapper itself are read into [`LumigoConfig`]; every
//! other key is forwarded, in document order, to the tracer configuration
//! embedded in generated wrappers.

use crate::constants::{defaults, tracer};
use crate::error::Result;
use crate::service::{truthy, Service};
use crate::template::{OptionValue, TracerOptions};
use serde::Deserialize;
use serde_yaml::Value;

/// Keys consumed by the wrapper and never forwarded to the tracer.
pub const CONTROL_KEYS: [&str; 11] = [
    "token",
    "enabled",
    "pinVersion",
    "skipInstallNodeTracer",
    "skipReqCheck",
    "useLayers",
    "nodePackageManager",
    "nodeLayerVersion",
    "pythonLayerVersion",
    "nodeUseESModule",
    "nodeModuleFileExtension",
];

/// Effective wrapper configuration for one service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LumigoConfig {
    pub token: Option<String>,
    pub pin_version: Option<String>,
    pub skip_install_node_tracer: bool,
    pub skip_req_check: bool,
    pub use_layers: bool,
    /// Validated when a package manager command is built.
    pub node_package_manager: Option<String>,
    pub node_layer_version: Option<String>,
    pub python_layer_version: Option<String>,
    pub node_use_es_module: bool,
    pub node_module_file_extension: Option<String>,
    pub tracer_options: TracerOptions,
}

// Scalars are taken as strings so `pinVersion: 1.2` or `nodeLayerVersion: 87` work.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    token: Option<Value>,
    pin_version: Option<Value>,
    skip_install_node_tracer: Option<Value>,
    skip_req_check: Option<Value>,
    use_layers: Option<Value>,
    node_package_manager: Option<Value>,
    node_layer_version: Option<Value>,
    python_layer_version: Option<Value>,
    #[serde(rename = "nodeUseESModule")]
    node_use_es_module: Option<Value>,
    node_module_file_extension: Option<Value>,
}

impl LumigoConfig {
    /// Reads `custom.lumigo` from the service; an absent section yields the defaults.
    pub fn from_service(service: &Service) -> Result<Self> {
        match service.lumigo_section() {
            Some(section) => Self::from_value(section),
            None => Ok(Self::default()),
        }
    }

    pub fn from_value(section: &Value) -> Result<Self> {
        if section.is_null() {
            return Ok(Self::default());
        }

        let raw: RawSettings = serde_yaml::from_value(section.clone())?;
        let flag = |v: &Option<Value>| v.as_ref().is_some_and(truthy);

        let mut tracer_options = TracerOptions::new();
        if let Value::Mapping(mapping) = section {
            for (key, value) in mapping {
                let Some(key) = key.as_str() else { continue };
                if CONTROL_KEYS.contains(&key) {
                    continue;
                }
                match scalar(value) {
                    Some(text) => {
                        let value = match value {
                            Value::Bool(b) => OptionValue::Bool(*b),
                            _ => OptionValue::from_text(text),
                        };
                        tracer_options.push(key, value);
                    }
                    None => tracing::warn!(
                        option = key,
                        "Ignoring non-scalar tracer option; only strings, numbers and booleans are forwarded"
                    ),
                }
            }
        }

        Ok(LumigoConfig {
            token: raw.token.as_ref().and_then(scalar),
            pin_version: raw.pin_version.as_ref().and_then(scalar),
            skip_install_node_tracer: flag(&raw.skip_install_node_tracer),
            skip_req_check: flag(&raw.skip_req_check),
            use_layers: flag(&raw.use_layers),
            node_package_manager: raw.node_package_manager.as_ref().and_then(scalar),
            node_layer_version: raw.node_layer_version.as_ref().and_then(scalar),
            python_layer_version: raw.python_layer_version.as_ref().and_then(scalar),
            node_use_es_module: flag(&raw.node_use_es_module),
            node_module_file_extension: raw.node_module_file_extension.as_ref().and_then(scalar),
            tracer_options,
        })
    }

    /// Version spec for the node tracer package, `latest` unless pinned.
    pub fn node_tracer_version(&self) -> &str {
        self.pin_version
            .as_deref()
            .unwrap_or(tracer::NODE_DEFAULT_VERSION)
    }

    pub fn node_module_file_extension(&self) -> &str {
        self.node_module_file_extension
            .as_deref()
            .unwrap_or(defaults::NODE_MODULE_FILE_EXTENSION)
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
