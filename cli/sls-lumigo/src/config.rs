//! Resolution of the effective wrapper configuration.
//!
//! Precedence: command-line flags > environment variables > `custom.lumigo`
//! in the service description. The flag/environment step is resolved by clap.

use crate::cli::GlobalArgs;
use anyhow::{Context, Result};
use lumigo_wrapper::{LumigoConfig, Service};
use std::env;
use std::path::Path;

/// Debug flag honoured by the serverless framework.
pub const SLS_DEBUG: &str = "SLS_DEBUG";

/// Loads the service description from `path`.
pub fn load_service(path: &Path) -> Result<Service> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read service description {}", path.display()))?;
    serde_yaml::from_str(&text)
        .with_context(|| format!("Failed to parse service description {}", path.display()))
}

/// Merges CLI flags and environment into the service's `custom.lumigo` settings.
pub fn effective_config(args: &GlobalArgs, service: &Service) -> Result<LumigoConfig> {
    let mut config =
        LumigoConfig::from_service(service).context("Failed to read custom.lumigo settings")?;

    // `--token` is also fed from LUMIGO_TRACER_TOKEN by clap
    if let Some(token) = args.token.clone().filter(|t| !t.is_empty()) {
        config.token = Some(token);
    }
    if args.use_layers {
        config.use_layers = true;
    }

    tracing::debug!(
        token_set = config.token.is_some(),
        use_layers = config.use_layers,
        "Resolved lumigo configuration"
    );
    Ok(config)
}

/// Whether the serverless debug flag is set.
pub fn sls_debug_enabled() -> bool {
    env::var(SLS_DEBUG).is_ok_and(|v| !v.is_empty())
}
