use crate::constants::layers;
use std::fmt;

/// Runtime families the tracer supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFamily {
    Node,
    Python,
}

impl RuntimeFamily {
    /// Classifies a provider runtime identifier such as `nodejs18.x` or `python3.11`.
    ///
    /// Only python 3 is supported; `python2.7` and every other runtime yield `None`.
    pub fn classify(runtime: &str) -> Option<Self> {
        if runtime.starts_with("nodejs") {
            Some(RuntimeFamily::Node)
        } else if runtime.starts_with("python3") {
            Some(RuntimeFamily::Python)
        } else {
            None
        }
    }

    pub fn layer_name(self) -> &'static str {
        match self {
            RuntimeFamily::Node => layers::NODE_LAYER_NAME,
            RuntimeFamily::Python => layers::PYTHON_LAYER_NAME,
        }
    }

    /// Handler that the tracer layer exposes in place of the user's handler.
    pub fn layer_handler(self) -> &'static str {
        match self {
            RuntimeFamily::Node => layers::NODE_HANDLER,
            RuntimeFamily::Python => layers::PYTHON_HANDLER,
        }
    }

    pub fn versions_url(self) -> &'static str {
        match self {
            RuntimeFamily::Node => layers::NODE_VERSIONS_URL,
            RuntimeFamily::Python => layers::PYTHON_VERSIONS_URL,
        }
    }
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeFamily::Node => write!(f, "nodejs"),
            RuntimeFamily::Python => write!(f, "python"),
        }
    }
}
