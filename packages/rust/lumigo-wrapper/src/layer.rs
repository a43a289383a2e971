//! Layer installation: attach the published tracer layer and redirect the handler.
//!
//! Layer ARNs have the form
//! `arn:aws:lambda:<region>:<publisher>:layer:<name>:<version>`. A pinned
//! version is used as is; otherwise the latest version is looked up in the
//! tracer's published version listing, once per runtime family and run.

use crate::constants::{env_vars, layers};
use crate::error::{Result, WrapError};
use crate::runtime::RuntimeFamily;
use crate::service::FunctionDescriptor;
use async_trait::async_trait;
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;

/// Latest layer ARNs resolved during one run, keyed by runtime family.
///
/// Filled lazily and never invalidated; create a new cache per run.
#[derive(Debug, Default)]
pub struct LayerArnCache {
    latest: HashMap<RuntimeFamily, String>,
}

impl LayerArnCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, family: RuntimeFamily) -> Option<&str> {
        self.latest.get(&family).map(String::as_str)
    }

    fn insert(&mut self, family: RuntimeFamily, arn: String) {
        self.latest.insert(family, arn);
    }
}

/// Source of the plaintext layer version listings.
#[async_trait]
pub trait VersionFeed: Send + Sync {
    async fn fetch(&self, family: RuntimeFamily) -> Result<String>;
}

/// Fetches version listings over HTTP.
#[derive(Debug, Clone)]
pub struct HttpVersionFeed {
    client: reqwest::Client,
    node_url: String,
    python_url: String,
}

impl Default for HttpVersionFeed {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl HttpVersionFeed {
    pub fn new(client: reqwest::Client) -> Self {
        HttpVersionFeed {
            client,
            node_url: RuntimeFamily::Node.versions_url().to_string(),
            python_url: RuntimeFamily::Python.versions_url().to_string(),
        }
    }

    /// Overrides the listing URLs, e.g. to point at a mirror.
    pub fn with_urls(mut self, node_url: impl Into<String>, python_url: impl Into<String>) -> Self {
        self.node_url = node_url.into();
        self.python_url = python_url.into();
        self
    }

    fn url(&self, family: RuntimeFamily) -> &str {
        match family {
            RuntimeFamily::Node => &self.node_url,
            RuntimeFamily::Python => &self.python_url,
        }
    }
}

#[async_trait]
impl VersionFeed for HttpVersionFeed {
    async fn fetch(&self, family: RuntimeFamily) -> Result<String> {
        let url = self.url(family);
        tracing::debug!(url, "fetching latest {} layer versions", family);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Unversioned layer ARN for `family` in `region`.
pub fn base_arn(region: &str, family: RuntimeFamily) -> String {
    format!(
        "arn:aws:lambda:{}:{}:layer:{}",
        region,
        layers::PUBLISHER_ACCOUNT,
        family.layer_name()
    )
}

/// First `<base_arn>:<digits>` occurrence in `document`.
pub fn extract_latest_arn(document: &str, base_arn: &str) -> Option<String> {
    let pattern = Regex::new(&format!(r"{}:\d+", regex::escape(base_arn))).ok()?;
    pattern.find(document).map(|m| m.as_str().to_string())
}

/// Resolves the layer ARN to attach for `family`.
pub async fn resolve_layer_arn(
    family: RuntimeFamily,
    region: &str,
    pinned_version: Option<&str>,
    cache: &mut LayerArnCache,
    feed: &dyn VersionFeed,
) -> Result<String> {
    let base = base_arn(region, family);

    if let Some(version) = pinned_version {
        return Ok(format!("{}:{}", base, version));
    }

    if let Some(arn) = cache.get(family) {
        return Ok(arn.to_string());
    }

    let document = feed.fetch(family).await?;
    let arn = extract_latest_arn(&document, &base)
        .ok_or(WrapError::LayerVersionNotFound { base_arn: base })?;
    tracing::debug!(arn = %arn, "resolved latest {} layer", family);
    cache.insert(family, arn.clone());
    Ok(arn)
}

/// Attaches `arn` to the function and points its handler at the layer's entry point.
///
/// The original handler is kept in `LUMIGO_ORIGINAL_HANDLER` for the layer to load.
pub fn attach_layer(
    function: &mut FunctionDescriptor,
    family: RuntimeFamily,
    arn: &str,
    token: &str,
    provider_layers: Option<&[Value]>,
) {
    function.append_layer(arn, provider_layers);
    let original = std::mem::replace(&mut function.handler, family.layer_handler().to_string());
    function.set_environment(env_vars::ORIGINAL_HANDLER, &original);
    function.set_environment(env_vars::TRACER_TOKEN, token);
}
