//! gitcredentials - provision git credentials during a buildpack build

use clap::{Args, Parser, Subcommand};
use gitcreds_cli::commands;
use gitcreds_core::{BuildContext, DetectContext, ProcessEnvironment};
use gitcreds_git::CliGit;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gitcredentials")]
#[command(author, version, about = "Git credentials buildpack", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// git executable to run
    #[arg(long, global = true, env = "GITCREDENTIALS_GIT", default_value = "git")]
    git: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Dirs {
    /// Buildpack root holding buildpack.toml (defaults to the parent of bin/)
    #[arg(long, env = "CNB_BUILDPACK_DIR")]
    buildpack_dir: Option<PathBuf>,

    /// Application directory holding buildpack.yml (defaults to the current directory)
    #[arg(long)]
    working_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether to participate in the build
    Detect {
        /// Platform directory
        platform_dir: PathBuf,
        /// Build plan output path
        plan_path: PathBuf,
        #[command(flatten)]
        dirs: Dirs,
    },

    /// Provision credentials into the global git configuration
    Build {
        /// Layers directory
        layers_dir: PathBuf,
        /// Platform directory
        platform_dir: PathBuf,
        /// Resolved build plan path
        plan_path: PathBuf,
        #[command(flatten)]
        dirs: Dirs,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Detect {
            platform_dir,
            plan_path,
            dirs,
        } => {
            tracing::debug!("Platform directory: {:?}", platform_dir);
            let context = DetectContext {
                buildpack_dir: commands::buildpack_dir(dirs.buildpack_dir)?,
                working_dir: commands::working_dir(dirs.working_dir)?,
            };
            commands::detect(&context, &ProcessEnvironment, &plan_path)
        }
        Commands::Build {
            layers_dir,
            platform_dir,
            plan_path,
            dirs,
        } => {
            tracing::debug!("Platform directory: {:?}, plan: {:?}", platform_dir, plan_path);
            let context = BuildContext {
                buildpack_dir: commands::buildpack_dir(dirs.buildpack_dir)?,
                working_dir: commands::working_dir(dirs.working_dir)?,
                layers_dir,
            };
            let git = Arc::new(CliGit::new(cli.git));
            commands::build(&context, &ProcessEnvironment, git).await?;
            Ok(0)
        }
    }
}
