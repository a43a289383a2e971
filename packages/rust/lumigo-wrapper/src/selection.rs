use crate::error::{Result, WrapError};
use crate::runtime::RuntimeFamily;
use crate::service::{FunctionDescriptor, Service};
use serde::Serialize;

/// A function picked for wrapping, with a snapshot of its descriptor.
///
/// The snapshot is only used for decisions; mutations go to the service's live entry.
#[derive(Debug, Clone, Serialize)]
pub struct SelectedFunction {
    #[serde(rename = "localName")]
    pub local_name: String,
    #[serde(flatten)]
    pub descriptor: FunctionDescriptor,
}

/// Outcome of function selection for one hook invocation.
#[derive(Debug, Clone)]
pub struct Selection {
    /// `None` when the service runtime is not supported.
    pub family: Option<RuntimeFamily>,
    pub functions: Vec<SelectedFunction>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Picks the functions eligible for wrapping.
///
/// `only` restricts the selection to the named functions (single-function
/// deploys); otherwise every declared function is considered. Functions with
/// `lumigo.enabled: false` are dropped, and an unsupported service runtime
/// yields an empty selection.
pub fn functions_to_wrap(service: &Service, only: Option<&[String]>) -> Result<Selection> {
    let names: Vec<&str> = match only {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => service.functions.keys().map(String::as_str).collect(),
    };

    let mut functions = Vec::with_capacity(names.len());
    for name in names {
        let descriptor = service
            .functions
            .get(name)
            .ok_or_else(|| WrapError::UnknownFunction(name.to_string()))?;
        if !descriptor.is_enabled() {
            tracing::debug!(function = name, "lumigo is disabled for function, skipped");
            continue;
        }
        functions.push(SelectedFunction {
            local_name: name.to_string(),
            descriptor: descriptor.clone(),
        });
    }

    let runtime = service.provider.runtime.as_deref().unwrap_or_default();
    match RuntimeFamily::classify(runtime) {
        Some(family) => Ok(Selection {
            family: Some(family),
            functions,
        }),
        None => {
            tracing::info!("unsupported runtime: [{}], skipped...", runtime);
            Ok(Selection {
                family: None,
                functions: Vec::new(),
            })
        }
    }
}
