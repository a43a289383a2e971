mod cli;
mod config;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use colored::*;
use lumigo_wrapper::{Hook, LumigoPlugin, Service};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{CliArgs, Commands, GlobalArgs};
use crate::config::{effective_config, load_service, sls_debug_enabled};

/// sls-lumigo: wrap serverless functions with the Lumigo tracer.
#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    if let Commands::GenerateCompletions { shell } = args.command {
        let mut cmd = CliArgs::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    init_logging(args.global.verbose);

    let service_file = args.global.service_file();
    let mut service = load_service(&service_file)?;
    let config = effective_config(&args.global, &service)?;
    let mut plugin = build_plugin(&args.global, config);

    match args.command {
        Commands::Hook { hooks, output } => {
            let hooks: Vec<Hook> = hooks.into_iter().map(Hook::from).collect();
            run_hooks(&mut plugin, &hooks, &mut service).await?;
            emit_service(&service, output.as_deref())?;
        }
        Commands::Render { function } => {
            let artifact = plugin
                .preview(&service, &function)
                .with_context(|| format!("Failed to render wrapper for {}", function))?;
            eprintln!(
                "{} {}",
                "# would write".dimmed(),
                artifact.output_path.display().to_string().bold()
            );
            print!("{}", artifact.source_text);
        }
        Commands::GenerateCompletions { .. } => {
            unreachable!("completions are generated before the service is loaded");
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let log_level = match (verbose, sls_debug_enabled()) {
        (0, false) => LevelFilter::INFO,
        (0, true) | (1, _) => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy(format!(
                    "sls_lumigo={level},lumigo_wrapper={level}",
                    level = log_level
                )),
        )
        .init();
}

fn build_plugin(args: &GlobalArgs, config: lumigo_wrapper::LumigoConfig) -> LumigoPlugin {
    let mut plugin = LumigoPlugin::new(&args.service_dir, config);
    if let Some(function) = &args.function {
        plugin = plugin.with_function(function);
    }
    if let Some(region) = &args.region {
        plugin = plugin.with_region(region);
    }
    plugin
}

async fn run_hooks(plugin: &mut LumigoPlugin, hooks: &[Hook], service: &mut Service) -> Result<()> {
    for hook in hooks {
        tracing::debug!(hook = %hook, "Running hook");
        plugin
            .run_hook(*hook, service)
            .await
            .with_context(|| format!("Hook {} failed", hook))?;
        eprintln!("{} {}", "✔".green(), hook.to_string().bold());
    }
    Ok(())
}

fn emit_service(service: &Service, output: Option<&Path>) -> Result<()> {
    let yaml = serde_yaml::to_string(service).context("Failed to serialize service")?;
    match output {
        Some(path) => {
            std::fs::write(path, yaml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote modified service to {}", path.display());
        }
        None => print!("{}", yaml),
    }
    Ok(())
}
