//! QRFrame CLI - frame new photos from a watched folder and publish them with a QR link.
//!
//! Every photo dropped into the watched folder is downloaded, placed inside a
//! frame template, uploaded again, and stamped with a QR code that points at
//! the uploaded copy.
//!
//! # Usage
//!
//! ```bash
//! # Poll forever (Ctrl-C to stop)
//! qrframe run
//!
//! # Run a single poll cycle
//! qrframe once
//!
//! # Show per-photo progress
//! qrframe status
//!
//! # View configuration
//! qrframe config show
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;
mod logging;

/// QRFrame - frame new photos and publish them with a QR download link.
#[derive(Parser, Debug)]
#[command(name = "qrframe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(short, long, global = true, env = "QRFRAME_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the watched folder until interrupted
    Run,

    /// Run a single poll cycle and exit
    Once(cli::once::OnceArgs),

    /// Show the recorded progress of every photo
    Status(cli::status::StatusArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let loaded = cli::load_config(cli.config.as_deref());
    match &loaded {
        Ok(config) => logging::init_from_config(config, cli.verbose, cli.json_logs),
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e:#}\n  \
                 Check your config file with `qrframe config path`."
            );
            logging::init_from_config(&qrframe_core::Config::default(), cli.verbose, cli.json_logs);
        }
    }

    tracing::debug!("QRFrame v{}", qrframe_core::VERSION);

    match cli.command {
        Commands::Run => cli::run::execute(loaded?).await,
        Commands::Once(args) => cli::once::execute(loaded?, args).await,
        Commands::Status(args) => cli::status::execute(loaded?, args).await,
        Commands::Config(args) => cli::config::execute(args, cli.config.as_deref(), loaded).await,
    }
}
