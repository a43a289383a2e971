//! Packaging-time Lumigo tracing for serverless functions.
//!
//! This crate rewrites a serverless service description so that its Node.js
//! and Python functions run under the Lumigo tracer, without touching the
//! user's handler code.
//!
//! # Installation strategies
//!
//! - **Inline**: a small wrapper module is generated for every function under
//!   `_lumigo/`, the function's handler is pointed at it and the wrapper
//!   directory is added to the package includes. For Node.js the
//!   `@lumigo/tracer` dependency is installed with npm, yarn or pnpm for the
//!   duration of packaging; for Python the tracer must already be declared in
//!   the requirements file(s).
//! - **Layers**: the published tracer layer is attached to each function,
//!   the original handler is moved to `LUMIGO_ORIGINAL_HANDLER` and the
//!   handler is replaced by the layer's entry point. Used when `useLayers` is
//!   set or when `serverless-esbuild` bundles the service.
//!
//! # Architecture
//!
//! - [`service`]: typed view over `serverless.yml`, round-trips unknown keys
//! - [`config`]: the `custom.lumigo` section
//! - [`handler`]: handler string decomposition
//! - [`template`]: wrapper source generation
//! - [`selection`]: which functions get wrapped
//! - [`inline`] and [`layer`]: the two installation strategies
//! - [`plugin`]: maps lifecycle hooks onto the strategies
//!
//! # Example
//!
//! ```no_run
//! use lumigo_wrapper::{Hook, LumigoConfig, LumigoPlugin, Service};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("serverless.yml")?;
//! let mut service: Service = serde_yaml::from_str(&text)?;
//! let config = LumigoConfig::from_service(&service)?;
//!
//! let mut plugin = LumigoPlugin::new(".", config);
//! plugin.run_hook(Hook::PackageInitialize, &mut service).await?;
//! // ... package the service ...
//! plugin.run_hook(Hook::CreateDeploymentArtifacts, &mut service).await?;
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod handler;
pub mod inline;
pub mod layer;
pub mod plugin;
pub mod runtime;
pub mod selection;
pub mod service;
pub mod template;

pub use command::{CommandRunner, PackageCommand, PackageManager, ShellCommandRunner};
pub use config::LumigoConfig;
pub use error::{Result, WrapError};
pub use inline::WrapperArtifact;
pub use layer::{HttpVersionFeed, LayerArnCache, VersionFeed};
pub use plugin::{Hook, InstallStrategy, LumigoPlugin};
pub use runtime::RuntimeFamily;
pub use service::{FunctionDescriptor, Service};
pub use template::{TracerOptions, WrapperTemplate};
