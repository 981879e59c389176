//! CLI interface for quotecast
//!
//! Provides subcommands for:
//! - `run`: Start the demo market-data engine
//! - `status`: Show current state
//! - `config`: Show configuration

mod run;

pub use run::RunArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "quotecast")]
#[command(about = "Real-time quote cache and snapshot scheduler for a simulated exchange")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the demo market-data engine
    Run(RunArgs),
    /// Show current state
    Status,
    /// Show configuration
    Config,
}
