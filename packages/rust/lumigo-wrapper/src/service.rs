//! Typed view over a serverless service description.
//!
//! Only the keys the wrapper reads or writes are modelled; everything else is
//! kept in flattened maps so a description can be loaded, mutated and written
//! back without losing unrelated configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// The service being packaged, acting as the function registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: Provider,

    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Plugins::is_empty"
    )]
    pub plugins: Plugins,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<ServicePackage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Custom>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub functions: IndexMap<String, FunctionDescriptor>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

/// A key written with no value (`functions:`) reads as its default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Service {
    /// Raw `custom.lumigo` section, if any.
    pub fn lumigo_section(&self) -> Option<&Value> {
        self.custom.as_ref().and_then(|c| c.lumigo.as_ref())
    }

    pub fn python_requirements(&self) -> Option<&PythonRequirements> {
        self.custom
            .as_ref()
            .and_then(|c| c.python_requirements.as_ref())
    }

    pub fn packages_individually(&self) -> bool {
        self.package
            .as_ref()
            .and_then(|p| p.individually)
            .unwrap_or(false)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.contains(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Value>>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

/// `plugins` accepts both a plain list and the `{ modules: [...] }` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Plugins {
    List(Vec<String>),
    Modules {
        #[serde(default)]
        modules: Vec<String>,
        #[serde(flatten)]
        other: IndexMap<String, Value>,
    },
}

impl Default for Plugins {
    fn default() -> Self {
        Plugins::List(Vec::new())
    }
}

impl Plugins {
    pub fn names(&self) -> &[String] {
        match self {
            Plugins::List(names) => names,
            Plugins::Modules { modules, .. } => modules,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().iter().any(|n| n == name)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Plugins::List(names) if names.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServicePackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub individually: Option<bool>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Custom {
    /// Kept raw; parsed on demand by [`crate::config::LumigoConfig::from_service`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lumigo: Option<Value>,

    #[serde(
        rename = "pythonRequirements",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub python_requirements: Option<PythonRequirements>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

/// Settings shared with the serverless-python-requirements plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PythonRequirements {
    #[serde(rename = "fileName", default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<Value>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

impl PythonRequirements {
    pub fn zipped(&self) -> bool {
        self.zip.as_ref().is_some_and(truthy)
    }
}

/// One declared function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    #[serde(default)]
    pub handler: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lumigo: Option<FunctionLumigo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<IndexMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<FunctionPackage>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

/// Per-function `lumigo` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionLumigo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Value>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    #[serde(flatten)]
    pub other: IndexMap<String, Value>,
}

impl FunctionDescriptor {
    pub fn new(handler: impl Into<String>) -> Self {
        FunctionDescriptor {
            handler: handler.into(),
            ..Default::default()
        }
    }

    /// Only an explicit `lumigo.enabled: false` opts a function out.
    pub fn is_enabled(&self) -> bool {
        match self.lumigo.as_ref().and_then(|l| l.enabled.as_ref()) {
            Some(value) => !falsy(value),
            None => true,
        }
    }

    /// Appends `glob` to `package.include`, creating the list when absent.
    pub fn append_include(&mut self, glob: &str) {
        self.package
            .get_or_insert_with(FunctionPackage::default)
            .include
            .get_or_insert_with(Vec::new)
            .push(glob.to_string());
    }

    /// Appends `arn` to the function's layers.
    ///
    /// A function without its own `layers` inherits the provider's, which are
    /// copied in first so declaring function-level layers does not drop them.
    pub fn append_layer(&mut self, arn: &str, provider_layers: Option<&[Value]>) {
        self.layers
            .get_or_insert_with(|| provider_layers.map(<[Value]>::to_vec).unwrap_or_default())
            .push(Value::String(arn.to_string()));
    }

    pub fn set_environment(&mut self, key: &str, value: &str) {
        self.environment
            .get_or_insert_with(IndexMap::new)
            .insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// YAML booleans and the strings "true"/"false" in any case.
pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

pub(crate) fn falsy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !*b,
        Value::String(s) => s.eq_ignore_ascii_case("false"),
        _ => false,
    }
}
