//! Lifecycle orchestration: maps packaging hooks onto the installation strategies.

use crate::command::{CommandRunner, ShellCommandRunner};
use crate::config::LumigoConfig;
use crate::constants::{defaults, output, plugins};
use crate::error::{Result, WrapError};
use crate::inline::{self, WrapperArtifact};
use crate::layer::{self, HttpVersionFeed, LayerArnCache, VersionFeed};
use crate::runtime::RuntimeFamily;
use crate::selection::{functions_to_wrap, Selection};
use crate::service::Service;
use std::fmt;
use std::path::{Path, PathBuf};

/// Packaging lifecycle points the plugin reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Package metadata initialized; wraps every function.
    PackageInitialize,
    /// Single-function deploy initialized; wraps that function.
    DeployFunctionInitialize,
    /// Deployment artifacts created; cleans up or attaches layers.
    CreateDeploymentArtifacts,
    /// Single function packaged; cleans up or attaches the layer for that function.
    DeployFunctionPackage,
}

impl Hook {
    /// Whether the hook concerns only the function being deployed.
    pub fn is_single_function(self) -> bool {
        matches!(
            self,
            Hook::DeployFunctionInitialize | Hook::DeployFunctionPackage
        )
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::PackageInitialize => write!(f, "after:package:initialize"),
            Hook::DeployFunctionInitialize => write!(f, "after:deploy:function:initialize"),
            Hook::CreateDeploymentArtifacts => {
                write!(f, "after:package:createDeploymentArtifacts")
            }
            Hook::DeployFunctionPackage => write!(f, "after:deploy:function:packageFunction"),
        }
    }
}

/// How the tracer ends up in the deployed function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStrategy {
    /// Generated wrapper files plus a bundled tracer dependency.
    Inline,
    /// Published tracer layer plus handler redirection.
    Layers,
}

impl fmt::Display for InstallStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallStrategy::Inline => write!(f, "inline"),
            InstallStrategy::Layers => write!(f, "layers"),
        }
    }
}

impl InstallStrategy {
    /// Layers when configured, or when a bundler that cannot package the wrappers is in use.
    pub fn for_service(config: &LumigoConfig, service: &Service) -> Self {
        if config.use_layers || service.has_plugin(plugins::ESBUILD) {
            InstallStrategy::Layers
        } else {
            InstallStrategy::Inline
        }
    }
}

/// Runs lifecycle hooks against a service description.
///
/// One instance corresponds to one packaging run; the resolved layer ARNs
/// are cached for its lifetime.
pub struct LumigoPlugin {
    service_dir: PathBuf,
    config: LumigoConfig,
    function: Option<String>,
    region: Option<String>,
    runner: Box<dyn CommandRunner>,
    feed: Box<dyn VersionFeed>,
    layer_arns: LayerArnCache,
    /// Whether `package.json` declared the node tracer before this run touched it.
    node_tracer_declared: Option<bool>,
}

impl LumigoPlugin {
    /// Creates a plugin using the real package managers and the published version listings.
    pub fn new(service_dir: impl Into<PathBuf>, config: LumigoConfig) -> Self {
        LumigoPlugin {
            service_dir: service_dir.into(),
            config,
            function: None,
            region: None,
            runner: Box::new(ShellCommandRunner),
            feed: Box::new(HttpVersionFeed::default()),
            layer_arns: LayerArnCache::new(),
            node_tracer_declared: None,
        }
    }

    /// Names the function targeted by the single-function hooks.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Overrides the deployment region used for layer ARNs.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.runner = Box::new(runner);
        self
    }

    pub fn with_version_feed(mut self, feed: impl VersionFeed + 'static) -> Self {
        self.feed = Box::new(feed);
        self
    }

    pub fn config(&self) -> &LumigoConfig {
        &self.config
    }

    pub fn service_dir(&self) -> &Path {
        &self.service_dir
    }

    /// Runs one hook, mutating the service's functions in place.
    pub async fn run_hook(&mut self, hook: Hook, service: &mut Service) -> Result<()> {
        let strategy = InstallStrategy::for_service(&self.config, service);
        tracing::debug!(hook = %hook, strategy = %strategy, "running hook");

        let only = if hook.is_single_function() {
            let name = self
                .function
                .clone()
                .ok_or_else(|| WrapError::FunctionNameRequired(hook.to_string()))?;
            Some(vec![name])
        } else {
            None
        };
        let only = only.as_deref();

        if strategy == InstallStrategy::Inline && self.node_tracer_declared.is_none() {
            self.node_tracer_declared = Some(inline::node_tracer_declared(&self.service_dir).await);
        }

        match (hook, strategy) {
            (Hook::PackageInitialize | Hook::DeployFunctionInitialize, InstallStrategy::Inline) => {
                self.wrap(service, only).await
            }
            (Hook::PackageInitialize | Hook::DeployFunctionInitialize, InstallStrategy::Layers) => {
                Ok(())
            }
            (
                Hook::CreateDeploymentArtifacts | Hook::DeployFunctionPackage,
                InstallStrategy::Inline,
            ) => self.clean_up(service, only).await,
            (
                Hook::CreateDeploymentArtifacts | Hook::DeployFunctionPackage,
                InstallStrategy::Layers,
            ) => self.attach_layers(service, only).await,
        }
    }

    /// Generates the wrapper for one function without touching the file system.
    pub fn preview(&self, service: &Service, function: &str) -> Result<WrapperArtifact> {
        let only = [function.to_string()];
        let selection = functions_to_wrap(service, Some(&only))?;
        let (Some(family), Some(selected)) = (selection.family, selection.functions.first()) else {
            return Err(WrapError::NotWrappable(function.to_string()));
        };

        let template = inline::template_for(family, &self.config, service);
        WrapperArtifact::generate(
            &selected.local_name,
            &selected.descriptor.handler,
            &template,
            self.config.token.as_deref(),
            &self.config.tracer_options,
        )
    }

    async fn wrap(&self, service: &mut Service, only: Option<&[String]>) -> Result<()> {
        let selection = functions_to_wrap(service, only)?;
        log_selection(&selection);

        let Some(family) = selection.family else {
            return Ok(());
        };
        if selection.is_empty() {
            return Ok(());
        }
        let token = self.config.token.as_deref().ok_or(WrapError::MissingToken)?;

        match family {
            RuntimeFamily::Node => {
                inline::install_node_tracer(
                    &self.config,
                    self.node_tracer_declared.unwrap_or(false),
                    self.runner.as_ref(),
                    &self.service_dir,
                )
                .await?
            }
            RuntimeFamily::Python if self.config.skip_req_check => {
                tracing::info!("skipping requirements check...");
            }
            RuntimeFamily::Python => {
                inline::ensure_python_tracer_declared(
                    service,
                    &selection.functions,
                    &self.service_dir,
                )
                .await?
            }
        }

        let template = inline::template_for(family, &self.config, service);
        for function in &selection.functions {
            tracing::debug!("wrapping [{}]...", function.descriptor.handler);
            let artifact = WrapperArtifact::generate(
                &function.local_name,
                &function.descriptor.handler,
                &template,
                Some(token),
                &self.config.tracer_options,
            )?;
            artifact.write(&self.service_dir).await?;

            if let Some(live) = service.functions.get_mut(&function.local_name) {
                live.handler = artifact.wrapped_handler();
                live.append_include(output::INCLUDE_GLOB);
                tracing::debug!("modified handler to [{}]...", live.handler);
            }
        }
        Ok(())
    }

    async fn clean_up(&self, service: &Service, only: Option<&[String]>) -> Result<()> {
        let selection = functions_to_wrap(service, only)?;
        let Some(family) = selection.family else {
            return Ok(());
        };
        if selection.is_empty() {
            return Ok(());
        }

        inline::remove_output_folder(&self.service_dir).await?;
        if family == RuntimeFamily::Node {
            inline::uninstall_node_tracer(
                &self.config,
                self.node_tracer_declared.unwrap_or(false),
                self.runner.as_ref(),
                &self.service_dir,
            )
            .await?;
        }
        Ok(())
    }

    async fn attach_layers(&mut self, service: &mut Service, only: Option<&[String]>) -> Result<()> {
        let selection = functions_to_wrap(service, only)?;
        log_selection(&selection);
        if selection.is_empty() {
            return Ok(());
        }
        let token = self.config.token.as_deref().ok_or(WrapError::MissingToken)?;

        let region = self
            .region
            .clone()
            .or_else(|| service.provider.region.clone())
            .unwrap_or_else(|| defaults::REGION.to_string());
        let provider_runtime = service.provider.runtime.clone();
        let provider_layers = service.provider.layers.clone();

        for function in &selection.functions {
            let runtime = function
                .descriptor
                .runtime
                .as_deref()
                .or(provider_runtime.as_deref())
                .unwrap_or_default();
            let Some(family) = RuntimeFamily::classify(runtime) else {
                tracing::info!(
                    "unsupported runtime [{}] for function [{}], skipped...",
                    runtime,
                    function.local_name
                );
                continue;
            };

            let pinned = match family {
                RuntimeFamily::Node => self.config.node_layer_version.as_deref(),
                RuntimeFamily::Python => self.config.python_layer_version.as_deref(),
            };
            let arn = layer::resolve_layer_arn(
                family,
                &region,
                pinned,
                &mut self.layer_arns,
                self.feed.as_ref(),
            )
            .await?;

            if let Some(live) = service.functions.get_mut(&function.local_name) {
                tracing::debug!("adding layer [{}] to [{}]...", arn, function.local_name);
                layer::attach_layer(live, family, &arn, token, provider_layers.as_deref());
            }
        }
        Ok(())
    }
}

fn log_selection(selection: &Selection) {
    tracing::info!(
        "there are {} function(s) to wrap...",
        selection.functions.len()
    );
    for function in &selection.functions {
        match serde_json::to_string(function) {
            Ok(json) => tracing::debug!("{}", json),
            Err(e) => tracing::debug!(error = %e, "could not serialize function"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MockCommandRunner;
    use crate::service::{FunctionDescriptor, Plugins};
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct StaticFeed(&'static str);

    #[async_trait]
    impl VersionFeed for StaticFeed {
        async fn fetch(&self, _family: RuntimeFamily) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct UnreachableFeed;

    #[async_trait]
    impl VersionFeed for UnreachableFeed {
        async fn fetch(&self, family: RuntimeFamily) -> Result<String> {
            panic!("unexpected version lookup for {}", family);
        }
    }

    fn service(runtime: &str, functions: &[(&str, &str)]) -> Service {
        let mut service = Service::default();
        service.provider.runtime = Some(runtime.to_string());
        for (name, handler) in functions {
            service
                .functions
                .insert(name.to_string(), FunctionDescriptor::new(*handler));
        }
        service
    }

    fn config_with_token() -> LumigoConfig {
        LumigoConfig {
            token: Some("t_123".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_strategy_selection() {
        let mut service = service("nodejs18.x", &[]);
        assert_eq!(
            InstallStrategy::for_service(&LumigoConfig::default(), &service),
            InstallStrategy::Inline
        );

        let layers = LumigoConfig {
            use_layers: true,
            ..Default::default()
        };
        assert_eq!(
            InstallStrategy::for_service(&layers, &service),
            InstallStrategy::Layers
        );

        service.plugins = Plugins::List(vec!["serverless-esbuild".to_string()]);
        assert_eq!(
            InstallStrategy::for_service(&LumigoConfig::default(), &service),
            InstallStrategy::Layers
        );
    }

    #[test]
    fn test_hook_names() {
        assert_eq!(Hook::PackageInitialize.to_string(), "after:package:initialize");
        assert!(Hook::DeployFunctionPackage.is_single_function());
        assert!(!Hook::CreateDeploymentArtifacts.is_single_function());
    }

    #[tokio::test]
    async fn test_wrap_without_token_fails_before_install() {
        let dir = tempdir().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();

        let mut plugin = LumigoPlugin::new(dir.path(), LumigoConfig::default())
            .with_runner(runner)
            .with_version_feed(UnreachableFeed);
        let mut service = service("nodejs18.x", &[("hello", "hello.world")]);

        let err = plugin
            .run_hook(Hook::PackageInitialize, &mut service)
            .await
            .unwrap_err();
        assert!(matches!(err, WrapError::MissingToken));
        assert_eq!(service.functions["hello"].handler, "hello.world");
    }

    #[tokio::test]
    async fn test_single_function_hook_requires_name() {
        let dir = tempdir().unwrap();
        let mut plugin = LumigoPlugin::new(dir.path(), config_with_token())
            .with_runner(MockCommandRunner::new())
            .with_version_feed(UnreachableFeed);
        let mut service = service("nodejs18.x", &[("hello", "hello.world")]);

        let err = plugin
            .run_hook(Hook::DeployFunctionInitialize, &mut service)
            .await
            .unwrap_err();
        assert!(matches!(err, WrapError::FunctionNameRequired(_)));
    }

    #[tokio::test]
    async fn test_single_function_wrap() {
        let dir = tempdir().unwrap();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(1).returning(|_, _| Ok(()));

        let mut plugin = LumigoPlugin::new(dir.path(), config_with_token())
            .with_function("bar")
            .with_runner(runner)
            .with_version_feed(UnreachableFeed);
        let mut service = service(
            "nodejs18.x",
            &[("foo", "foo_bar.handler"), ("bar", "foo_bar.handler")],
        );

        plugin
            .run_hook(Hook::DeployFunctionInitialize, &mut service)
            .await
            .unwrap();

        assert_eq!(service.functions["foo"].handler, "foo_bar.handler");
        assert_eq!(service.functions["bar"].handler, "_lumigo/bar.handler");
        assert!(dir.path().join("_lumigo/bar.js").exists());
        assert!(!dir.path().join("_lumigo/foo.js").exists());
    }

    #[tokio::test]
    async fn test_python_skip_req_check() {
        let dir = tempdir().unwrap();
        let config = LumigoConfig {
            skip_req_check: true,
            ..config_with_token()
        };
        let mut plugin = LumigoPlugin::new(dir.path(), config)
            .with_runner(MockCommandRunner::new())
            .with_version_feed(UnreachableFeed);
        let mut service = service("python3.9", &[("hello", "hello.world")]);

        plugin
            .run_hook(Hook::PackageInitialize, &mut service)
            .await
            .unwrap();

        assert_eq!(service.functions["hello"].handler, "_lumigo/hello.world");
        let include = service.functions["hello"]
            .package
            .as_ref()
            .and_then(|p| p.include.clone())
            .unwrap();
        assert_eq!(include, vec!["_lumigo/*".to_string()]);
    }

    #[tokio::test]
    async fn test_layers_mode_leaves_initialize_alone() {
        let dir = tempdir().unwrap();
        let config = LumigoConfig {
            use_layers: true,
            ..config_with_token()
        };
        let mut runner = MockCommandRunner::new();
        runner.expect_run().never();
        let mut plugin = LumigoPlugin::new(dir.path(), config)
            .with_runner(runner)
            .with_version_feed(UnreachableFeed);
        let mut service = service("nodejs18.x", &[("hello", "hello.world")]);

        plugin
            .run_hook(Hook::PackageInitialize, &mut service)
            .await
            .unwrap();

        assert_eq!(service.functions["hello"].handler, "hello.world");
        assert!(!dir.path().join("_lumigo").exists());
    }

    #[tokio::test]
    async fn test_layers_use_function_runtime_and_pins() {
        let dir = tempdir().unwrap();
        let config = LumigoConfig {
            use_layers: true,
            node_layer_version: Some("87".to_string()),
            ..config_with_token()
        };
        let mut plugin = LumigoPlugin::new(dir.path(), config)
            .with_region("eu-west-1")
            .with_runner(MockCommandRunner::new())
            .with_version_feed(StaticFeed(
                "arn:aws:lambda:eu-west-1:114300393969:layer:lumigo-python-tracer:230",
            ));
        let mut service = service(
            "nodejs18.x",
            &[("api", "api.handler"), ("worker", "worker.handler")],
        );
        service.provider.region = Some("us-west-2".to_string());
        service.functions["worker"].runtime = Some("python3.11".to_string());

        plugin
            .run_hook(Hook::CreateDeploymentArtifacts, &mut service)
            .await
            .unwrap();

        let api = &service.functions["api"];
        assert_eq!(api.handler, "lumigo-auto-instrument.handler");
        assert_eq!(
            api.layers.as_ref().unwrap()[0].as_str(),
            Some("arn:aws:lambda:eu-west-1:114300393969:layer:lumigo-node-tracer:87")
        );

        let worker = &service.functions["worker"];
        assert_eq!(worker.handler, "/opt/python/lumigo_tracer._handler");
        assert_eq!(
            worker.layers.as_ref().unwrap()[0].as_str(),
            Some("arn:aws:lambda:eu-west-1:114300393969:layer:lumigo-python-tracer:230")
        );
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let dir = tempdir().unwrap();
        let plugin = LumigoPlugin::new(dir.path(), config_with_token())
            .with_runner(MockCommandRunner::new())
            .with_version_feed(UnreachableFeed);
        let service = service("nodejs18.x", &[("pack", "foo.bar/zoo.handler")]);

        let artifact = plugin.preview(&service, "pack").unwrap();
        assert!(artifact
            .source_text
            .contains("require('../foo.bar/zoo').handler"));
        assert!(!dir.path().join("_lumigo").exists());

        let unsupported = self::service("java11", &[("pack", "foo.bar/zoo.handler")]);
        assert!(matches!(
            plugin.preview(&unsupported, "pack"),
            Err(WrapError::NotWrappable(_))
        ));
    }
}
