//! Command-line interface for checkfleet.
//!
//! This module provides the CLI structure for the `checkfleet` binary, an
//! operator tool over the checklist repository.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DeleteCommand, ImportCommand, ListCommand, NewCommand, ShowCommand,
    StatusCommand, ValidateCommand,
};

/// checkfleet - Vehicle inspection checklists
///
/// Reads and writes checklists in the local store or, when remote
/// credentials are configured, in the remote collection.
#[derive(Debug, Parser)]
#[command(name = "checkfleet")]
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
    /// Show the active backend and storage locations
    Status(StatusCommand),

    /// List checklists, newest first
    List(ListCommand),

    /// Print one checklist as JSON
    Show(ShowCommand),

    /// Print a blank checklist built from the inspection template
    New(NewCommand),

    /// Validate a checklist JSON file and save it
    Import(ImportCommand),

    /// Delete a checklist
    Delete(DeleteCommand),

    /// Upload every local checklist to the remote backend
    Sync,

    /// Check individual field values
    Validate(ValidateCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
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
