//! CLI interface for tabsession

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tabsession")]
#[command(version)]
#[command(about = "Inspect and drive a persisted browser-style session", long_about = None)]
pub struct Cli {
    /// Path to tabsession.toml (defaults to searching upward from the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new tabsession.toml configuration file
    Init,

    /// Adopt a token as the current session
    Login {
        /// The token issued by the authentication server
        #[arg(env = "TABSESSION_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Clear the current session
    Logout,

    /// Show the current identity
    Whoami {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show rehydration result and storage details
    Status,

    /// Decode a token without touching the stored session
    Decode {
        /// Token to decode
        token: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the catalog actions the current identity may perform
    Permissions,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
