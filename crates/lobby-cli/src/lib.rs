//! Lobby CLI library
//!
//! Demo scenarios that drive lobby runtimes over a loopback network and print
//! what they report.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::AppConfig;
pub use error::{CliError, Result};
pub use output::Printer;
