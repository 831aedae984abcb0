//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Host a session and invite marked friends, who accept and join
    Demo,
    /// Seed remote sessions, then find and join the first one not our own
    Browse {
        /// Number of remote sessions to advertise
        #[arg(short, long, default_value_t = 3)]
        sessions: usize,
    },
    /// Print the effective configuration as TOML
    Config,
}
