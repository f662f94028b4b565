//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Generate command arguments.
#[derive(Debug, Args)]
pub struct GenerateCommand {
    /// Amount in reais (e.g. "25", "10.50", "10,50"). Omit, or pass
    /// anything unusable, to let the payer type the amount
    #[arg(short, long)]
    pub amount: Option<String>,

    /// Copy the payload to the clipboard
    #[arg(long)]
    pub to_clipboard: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Verify command arguments.
#[derive(Debug, Args)]
pub struct VerifyCommand {
    /// The payload to check
    pub payload: String,
}

/// Decode command arguments.
#[derive(Debug, Args)]
pub struct DecodeCommand {
    /// The payload to decode
    pub payload: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// CRC command arguments.
#[derive(Debug, Args)]
pub struct CrcCommand {
    /// Text to checksum
    pub text: String,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}
