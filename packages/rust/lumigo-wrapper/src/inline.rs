//! Inline installation: generated wrapper files plus a bundled tracer dependency.

use crate::command::{CommandRunner, PackageManager};
use crate::config::LumigoConfig;
use crate::constants::{output, plugins, tracer};
use crate::error::{Result, WrapError};
use crate::handler::{self, HandlerRef};
use crate::runtime::RuntimeFamily;
use crate::selection::SelectedFunction;
use crate::service::Service;
use crate::template::{TemplateContext, TracerOptions, WrapperTemplate};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A generated wrapper for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperArtifact {
    pub local_name: String,
    /// Module path as imported by the wrapper (slashes for node, dots for python).
    pub module_path: String,
    pub symbol_name: String,
    pub source_text: String,
    /// Relative to the service root.
    pub output_path: PathBuf,
}

impl WrapperArtifact {
    /// Generates the wrapper for `local_name`, whose current handler is `handler`.
    pub fn generate(
        local_name: &str,
        handler: &str,
        template: &WrapperTemplate,
        token: Option<&str>,
        options: &TracerOptions,
    ) -> Result<Self> {
        let handler = HandlerRef::parse(handler)?;
        let module_path = match template.family() {
            RuntimeFamily::Node => handler.node_module_path().to_string(),
            RuntimeFamily::Python => handler.python_module_path(),
        };

        let source_text = template.render(&TemplateContext {
            token,
            module_path: &module_path,
            symbol_name: handler.symbol(),
            options,
        })?;

        Ok(WrapperArtifact {
            local_name: local_name.to_string(),
            output_path: handler::wrapper_file(local_name, template.file_extension()),
            symbol_name: handler.symbol().to_string(),
            module_path,
            source_text,
        })
    }

    /// Handler reference to assign to the function once the wrapper is written.
    pub fn wrapped_handler(&self) -> String {
        handler::wrapped_handler(&self.local_name, &self.symbol_name)
    }

    /// Writes the wrapper below `service_dir`, creating the output folder as needed.
    pub async fn write(&self, service_dir: &Path) -> Result<()> {
        let path = service_dir.join(&self.output_path);
        tracing::debug!("writing wrapper function to [{}]...", path.display());
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &self.source_text).await?;
        Ok(())
    }
}

/// Chooses the wrapper shape for the service.
pub fn template_for(family: RuntimeFamily, config: &LumigoConfig, service: &Service) -> WrapperTemplate {
    let es_module_extension = config
        .node_use_es_module
        .then(|| config.node_module_file_extension());
    let zipped = service
        .python_requirements()
        .is_some_and(|r| r.zipped());
    WrapperTemplate::select(family, es_module_extension, zipped)
}

/// Whether `package.json` in `service_dir` already lists the node tracer under `dependencies`.
///
/// A missing or unparsable manifest counts as not declared.
pub async fn node_tracer_declared(service_dir: &Path) -> bool {
    let path = service_dir.join(tracer::NODE_MANIFEST);
    let manifest = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(
                error = %e,
                "could not read [{}], assuming {} is not installed",
                path.display(),
                tracer::NODE_PACKAGE
            );
            return false;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&manifest) {
        Ok(json) => json
            .get("dependencies")
            .and_then(|deps| deps.get(tracer::NODE_PACKAGE))
            .is_some(),
        Err(e) => {
            tracing::debug!(
                error = %e,
                "could not parse [{}], assuming {} is not installed",
                path.display(),
                tracer::NODE_PACKAGE
            );
            false
        }
    }
}

/// Adds the node tracer to the service's dependencies.
///
/// Skipped when configured so, or when the service declares the tracer itself
/// (`already_declared`, see [`node_tracer_declared`]).
pub async fn install_node_tracer(
    config: &LumigoConfig,
    already_declared: bool,
    runner: &dyn CommandRunner,
    service_dir: &Path,
) -> Result<()> {
    if config.skip_install_node_tracer {
        tracing::info!("skipping {} installation...", tracer::NODE_PACKAGE);
        return Ok(());
    }
    if already_declared {
        tracing::debug!("{} is already installed, skipped...", tracer::NODE_PACKAGE);
        return Ok(());
    }

    let manager = PackageManager::resolve(config.node_package_manager.as_deref())?;
    tracing::info!("installing {}...", tracer::NODE_PACKAGE);
    runner
        .run(&manager.install(config.node_tracer_version()), service_dir)
        .await
}

/// Removes the node tracer again, mirroring [`install_node_tracer`].
pub async fn uninstall_node_tracer(
    config: &LumigoConfig,
    already_declared: bool,
    runner: &dyn CommandRunner,
    service_dir: &Path,
) -> Result<()> {
    if config.skip_install_node_tracer || already_declared {
        return Ok(());
    }

    let manager = PackageManager::resolve(config.node_package_manager.as_deref())?;
    tracing::info!("uninstalling {}...", tracer::NODE_PACKAGE);
    runner.run(&manager.uninstall(), service_dir).await
}

/// Checks that the python tracer is declared in the applicable requirements file(s).
///
/// With `package.individually` each function's directory must hold its own
/// requirements file, unless `custom.pythonRequirements.fileName` overrides it.
pub async fn ensure_python_tracer_declared(
    service: &Service,
    functions: &[SelectedFunction],
    service_dir: &Path,
) -> Result<()> {
    tracing::info!("checking if lumigo_tracer is installed...");

    let override_name = service
        .python_requirements()
        .and_then(|r| r.file_name.as_deref());

    let files = if service.packages_individually() {
        tracing::info!(
            "functions are packed individually, ensuring each function has a requirement.txt..."
        );
        functions
            .iter()
            .map(|f| match override_name {
                Some(name) => Ok(PathBuf::from(name)),
                None => {
                    let handler = HandlerRef::parse(&f.descriptor.handler)?;
                    Ok(Path::new(handler.directory()).join(tracer::PYTHON_REQUIREMENTS_FILE))
                }
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        tracing::info!("ensuring there is a requirement.txt or equivalent...");
        vec![PathBuf::from(
            override_name.unwrap_or(tracer::PYTHON_REQUIREMENTS_FILE),
        )]
    };

    let hint = (!service.has_plugin(plugins::PYTHON_REQUIREMENTS)).then(|| {
        format!(
            "\nConsider using the {} plugin to help you package Python dependencies.",
            plugins::PYTHON_REQUIREMENTS
        )
    });

    for file in files {
        check_requirements_file(service_dir, &file, hint.as_deref()).await?;
    }
    Ok(())
}

async fn check_requirements_file(service_dir: &Path, file: &Path, hint: Option<&str>) -> Result<()> {
    let path = service_dir.join(file);
    tracing::debug!("checking requirements in [{}]...", path.display());

    if !tokio::fs::try_exists(&path).await? {
        return Err(WrapError::RequirementsNotFound {
            path: file.to_path_buf(),
            hint: hint.map(str::to_string),
        });
    }

    let requirements = tokio::fs::read_to_string(&path).await?;
    if !tracer::PYTHON_REQUIREMENT_MARKERS
        .iter()
        .any(|marker| requirements.contains(marker))
    {
        return Err(WrapError::TracerNotInRequirements {
            path: file.to_path_buf(),
        });
    }
    Ok(())
}

/// Deletes the generated wrapper folder; a missing folder is not an error.
pub async fn remove_output_folder(service_dir: &Path) -> Result<()> {
    let folder = service_dir.join(output::FOLDER);
    tracing::debug!("removing the temporary folder [{}]...", folder.display());
    match tokio::fs::remove_dir_all(&folder).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
