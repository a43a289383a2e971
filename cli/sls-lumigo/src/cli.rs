use clap::{crate_authors, crate_description, Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use lumigo_wrapper::Hook;
use std::path::PathBuf;

pub const SERVICE_FILE: &str = "serverless.yml";

const USAGE_EXAMPLES: &str = "\
EXAMPLES:
    # Wrap every function, package, then clean up, writing the resulting service
    sls-lumigo hook package-initialize create-deployment-artifacts -o .serverless/serverless.wrapped.yml

    # Attach layers instead of generating wrappers
    sls-lumigo --use-layers --region eu-west-1 hook create-deployment-artifacts

    # Single function deploy
    sls-lumigo --function hello hook deploy-function-initialize

    # Show the wrapper that would be generated for a function
    sls-lumigo render pack

    # Generate shell completions for zsh
    sls-lumigo generate-completions zsh";

#[derive(Parser, Debug)]
#[command(author = crate_authors!(", "), version, about = crate_description!(), long_about = None, after_help = USAGE_EXAMPLES)]
pub struct CliArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Service directory; wrappers are written below it and package managers run in it
    #[arg(short = 'C', long = "service-dir", default_value = ".", global = true)]
    pub service_dir: PathBuf,

    /// Service description to load (default: <service-dir>/serverless.yml)
    #[arg(short, long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Lumigo tracer token; overrides custom.lumigo.token
    #[arg(long, env = "LUMIGO_TRACER_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Attach the published tracer layers instead of generating wrappers
    #[arg(long = "use-layers", global = true)]
    pub use_layers: bool,

    /// Deployment region for layer ARNs (default: provider.region, then us-east-1)
    #[arg(short, long, global = true)]
    pub region: Option<String>,

    /// Function targeted by the single-function hooks
    #[arg(short, long, global = true)]
    pub function: Option<String>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run lifecycle hooks in order and emit the modified service
    Hook {
        /// Hooks to run, in order
        #[arg(required = true, value_enum)]
        hooks: Vec<HookArg>,

        /// Write the modified service here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the wrapper generated for a function without writing anything
    Render {
        /// Function name as declared in the service
        function: String,
    },

    /// Generate shell completions
    GenerateCompletions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum HookArg {
    PackageInitialize,
    DeployFunctionInitialize,
    CreateDeploymentArtifacts,
    DeployFunctionPackage,
}

impl From<HookArg> for Hook {
    fn from(arg: HookArg) -> Self {
        match arg {
            HookArg::PackageInitialize => Hook::PackageInitialize,
            HookArg::DeployFunctionInitialize => Hook::DeployFunctionInitialize,
            HookArg::CreateDeploymentArtifacts => Hook::CreateDeploymentArtifacts,
            HookArg::DeployFunctionPackage => Hook::DeployFunctionPackage,
        }
    }
}

impl GlobalArgs {
    pub fn service_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.service_dir.join(SERVICE_FILE))
    }
}
