//! KittyPress CLI - Command-line interface for KittyPress
//!
//! Provides commands for:
//! - Compressing files and folders into one archive
//! - Extracting an archive next to itself
//! - Granting folder access and finishing a deferred save
//! - Viewing and validating configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kittypress_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;
mod state;

use commands::{
    completions::CompletionsCommand, compress::CompressCommand, config::ConfigCommand,
    decompress::DecompressCommand, grant::GrantCommand, pending::PendingCommand,
};
use context::{config_path, Invocation};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "kittypress",
    version,
    about = "Compress and extract KittyPress archives"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Hide progress lines
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compress files and folders into one archive
    Compress(CompressCommand),
    /// Extract an archive into the folder that contains it
    Decompress(DecompressCommand),
    /// Grant write access to a folder and finish the pending save
    Grant(GrantCommand),
    /// Show the save waiting for a folder grant
    Pending(PendingCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Log filter for the verbosity flags; `-v` and above override the config
fn log_filter(verbose: u8, configured: &str) -> String {
    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config_path(cli.config.as_deref());

    // Setup tracing
    let configured = Config::load_or_default(&config_path).logging.level;
    let filter = log_filter(cli.verbose, &configured);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let invocation = Invocation {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        quiet: cli.quiet,
        config_path,
    };

    match cli.command {
        Commands::Compress(cmd) => cmd.execute(&invocation).await,
        Commands::Decompress(cmd) => cmd.execute(&invocation).await,
        Commands::Grant(cmd) => cmd.execute(&invocation).await,
        Commands::Pending(cmd) => cmd.execute(&invocation).await,
        Commands::Config(cmd) => cmd.execute(&invocation).await,
        Commands::Completions(cmd) => cmd.execute().await,
    }
}
