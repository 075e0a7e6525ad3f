//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};

use crate::checklist::{Role, Viewer};

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// List command arguments.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("viewer").required(true).args(["user", "admin"])))]
pub struct ListCommand {
    /// Show only checklists owned by this user
    #[arg(short, long, value_name = "ID")]
    pub user: Option<String>,

    /// Show every checklist
    #[arg(long)]
    pub admin: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl ListCommand {
    /// The viewer the listing is filtered for.
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        let role = if self.admin {
            Role::Admin
        } else {
            Role::Inspector
        };
        Viewer::new(self.user.clone().unwrap_or_default(), role)
    }
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Checklist id
    pub id: String,
}

/// New command arguments.
#[derive(Debug, Args)]
pub struct NewCommand {
    /// Owner of the new checklist
    #[arg(short, long, value_name = "ID")]
    pub user: String,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// JSON file holding one checklist
    pub file: PathBuf,

    /// Owner assigned when the file has none
    #[arg(short, long, value_name = "ID")]
    pub user: Option<String>,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Checklist id
    pub id: String,
}

/// Validate command arguments.
#[derive(Debug, Args)]
#[command(group(
    ArgGroup::new("fields")
        .required(true)
        .multiple(true)
        .args(["plate", "driver", "km", "date", "time"])
))]
pub struct ValidateCommand {
    /// Licence plate
    #[arg(long)]
    pub plate: Option<String>,

    /// Driver name
    #[arg(long)]
    pub driver: Option<String>,

    /// Odometer reading
    #[arg(long)]
    pub km: Option<String>,

    /// Date, YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,

    /// Time, HH:MM
    #[arg(long)]
    pub time: Option<String>,
}

impl ValidateCommand {
    /// Each supplied field with its name, in form order.
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("plate", &self.plate),
            ("driver", &self.driver),
            ("km", &self.km),
            ("date", &self.date),
            ("time", &self.time),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
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
