//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pingpong - fill a pixel grid by relaying between two peers
#[derive(Parser)]
#[command(
    name = "pp",
    about = "Fill an M x N pixel grid by relaying work between a ping and a pong peer",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the service (progress authority plus both peers)
    Serve {
        /// Override the configured listen address
        #[arg(short, long)]
        bind: Option<std::net::SocketAddr>,
    },

    /// Start a new run on an M x N grid
    Configure {
        /// Rows
        m: u64,
        /// Columns
        n: u64,
    },

    /// Kick off the ping-pong chain for the configured run
    Generate,

    /// Show fill progress
    Status {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Export the painted pixels
    Image {
        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Check that every painted pixel has a unique color
    Validate {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
}

/// Output format for client commands
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
