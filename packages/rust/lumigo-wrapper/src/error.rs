use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a lifecycle hook.
#[derive(Error, Debug)]
pub enum WrapError {
    #[error("Lumigo's tracer token is undefined")]
    MissingToken,

    #[error("unsupported node package manager: {0} (expected npm, yarn or pnpm)")]
    UnsupportedPackageManager(String),

    #[error("{} is not found.{}", path.display(), hint.as_deref().unwrap_or(""))]
    RequirementsNotFound { path: PathBuf, hint: Option<String> },

    #[error("lumigo_tracer is not installed. Please check {}.", path.display())]
    TracerNotInRequirements { path: PathBuf },

    #[error("command `{command}` failed with {status}")]
    CommandFailed { command: String, status: String },

    #[error("could not find a version of {base_arn} in the layer version listing")]
    LayerVersionNotFound { base_arn: String },

    #[error("handler '{0}' has no '.' separating module path from exported function")]
    MalformedHandler(String),

    #[error("function '{0}' is not declared in the service")]
    UnknownFunction(String),

    #[error("the {0} hook needs the name of the function being deployed")]
    FunctionNameRequired(String),

    #[error("function '{0}' is disabled or its runtime is not supported")]
    NotWrappable(String),

    #[error("invalid lumigo configuration: {0}")]
    InvalidConfig(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, WrapError>;
