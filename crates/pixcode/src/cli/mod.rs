//! Command-line interface for pixcode.
//!
//! This module provides the CLI structure for the `pixcode` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, CrcCommand, DecodeCommand, GenerateCommand, OutputFormat, VerifyCommand,
};

/// pixcode - PIX BR-Code payloads for donations
///
/// Builds "PIX copia e cola" payment codes for a configured merchant, and
/// checks or decodes codes produced elsewhere.
#[derive(Debug, Parser)]
#[command(name = "pixcode")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a payload for the configured merchant
    Generate(GenerateCommand),

    /// Check the checksum of a payload
    Verify(VerifyCommand),

    /// Verify a payload and print its fields
    Decode(DecodeCommand),

    /// Print the CRC16-CCITT of some text
    Crc(CrcCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Whether the command needs a loaded configuration.
    #[must_use]
    pub fn needs_config(&self) -> bool {
        matches!(
            self,
            Self::Generate(_) | Self::Config(ConfigCommand::Show { .. })
        )
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
