use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod config;
pub mod init;
pub mod inspect;
pub mod members;
pub mod replay;
pub mod state_file;
pub mod version;

use config::{default_config_path, CustodyConfig};

#[derive(Parser)]
#[command(name = "custody")]
#[command(author = "Custody Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for a shared-custody approval ledger", long_about = None)]
pub struct Cli {
    /// Log at debug level regardless of config
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Path to config file (default: ~/.config/custody/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Show the configured committee
    Members {
        /// Path to config file (default: ~/.config/custody/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Replay a scripted session against a vault
    Replay {
        /// Path to config file (default: ~/.config/custody/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Script of operations (TOML)
        script: PathBuf,

        /// Ledger state file to resume from and save to
        #[arg(long)]
        state: Option<PathBuf>,

        /// Print the audit trail as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect a saved ledger state file
    Inspect {
        /// Ledger state file
        state: PathBuf,

        /// Config used to label committee members (optional)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Init { config, force } => {
            let path = config.unwrap_or_else(default_config_path);
            init_logging(&log_level(cli.verbose, None));
            init::execute(&path, force)
        }
        Commands::Members { config } => {
            let path = config.unwrap_or_else(default_config_path);
            init_logging(&log_level(cli.verbose, Some(&path)));
            members::execute(&path)
        }
        Commands::Replay {
            config,
            script,
            state,
            json,
        } => {
            let path = config.unwrap_or_else(default_config_path);
            init_logging(&log_level(cli.verbose, Some(&path)));
            replay::execute(&path, &script, state.as_deref(), json).await
        }
        Commands::Inspect {
            state,
            config,
            json,
        } => {
            init_logging(&log_level(cli.verbose, config.as_deref()));
            inspect::execute(&state, config.as_deref(), json)
        }
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

/// Level from `--verbose`, else the config's `[logging] level`, else info.
fn log_level(verbose: bool, config_path: Option<&Path>) -> String {
    if verbose {
        return "debug".to_string();
    }
    config_path
        .filter(|p| p.exists())
        .and_then(|p| CustodyConfig::load(p).ok())
        .map(|c| c.logging.level)
        .unwrap_or_else(|| "info".to_string())
}

/// Logs go to stderr so command output on stdout stays machine-readable.
/// `RUST_LOG` takes precedence over the configured level.
fn init_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
