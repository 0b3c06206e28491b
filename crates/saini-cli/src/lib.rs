//! Saini command-line interface.

pub mod app;
pub mod commands;

use clap::{Parser, Subcommand};
use saini_core::config::Config;
use saini_core::ConfigError;
use std::path::Path;

/// Saini - emotional check-ins with semantic memory
#[derive(Parser)]
#[command(name = "saini")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config file
    #[arg(short, long, env = "SAINI_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check in with a message and get a reply
    Checkin(commands::checkin::CheckinArgs),

    /// Store or search semantic memories
    Memory(commands::memory::MemoryArgs),

    /// Show check-in history
    History {
        /// Only this user's check-ins
        #[arg(short, long)]
        user: Option<String>,

        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List users with check-ins
    Users,

    /// Summarize a user's check-ins
    Analytics {
        /// User to summarize
        #[arg(short, long)]
        user: String,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },

    /// Nudge users who have not checked in recently
    Nudge {
        /// Days of inactivity before a nudge (overrides config)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Configuration management
    Config(commands::config::ConfigArgs),

    /// Run diagnostics
    Doctor,

    /// Show version information
    Version,
}

/// Load the config named on the command line, or the default one.
///
/// An explicit path must exist. The default path falls back to built-in
/// defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load(path),
        None => Ok(Config::load_or_default()),
    }
}

/// Run the CLI with the given arguments.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Checkin(args) => commands::checkin::run(args, &config).await,
        Commands::Memory(args) => commands::memory::run(args, &config).await,
        Commands::History { user, limit } => {
            commands::history::history(&config, user.as_deref(), limit).await
        }
        Commands::Users => commands::history::users(&config).await,
        Commands::Analytics { user, json } => {
            commands::history::analytics(&config, &user, json).await
        }
        Commands::Nudge { days } => commands::nudge::run(&config, days).await,
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref()).await,
        Commands::Doctor => commands::doctor::run(&config).await,
        Commands::Version => {
            println!("saini {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
