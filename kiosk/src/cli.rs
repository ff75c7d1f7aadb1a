//! Command-line interface definitions.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// School lunch-ticket kiosk
#[derive(Parser, Debug)]
#[command(name = "ticketera")]
#[command(version)]
#[command(about = "School lunch-ticket kiosk: one ticket per student per day")]
#[command(long_about = "Issues at most one lunch ticket per student per day, keyed by RUT.\n\n\
    Students use `claim`. Everything else is an administrative command and \
    needs --password matching TICKETERA_ADMIN_PASSWORD.")]
pub struct Cli {
    /// Data directory (overrides TICKETERA_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Administrator password
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Claim today's ticket and print the receipt
    Claim {
        /// RUT in any formatting, e.g. 12.345.678-5
        rut: String,
    },

    /// Check whether a RUT could claim a ticket now, without issuing one
    Check {
        /// RUT in any formatting
        rut: String,
    },

    /// Manage the roster
    #[command(subcommand)]
    Users(UsersCommand),

    /// Inspect and export issued tickets
    #[command(subcommand)]
    Tickets(TicketsCommand),

    /// Import a roster from a CSV file
    Import {
        /// CSV file: count line, header line, then `id,datetime,rut,name,group` rows
        file: PathBuf,
    },

    /// Show roster and ticket counters
    Summary,

    /// Delete every user but keep the ticket history
    ClearUsers {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Delete every user and every ticket
    ClearAll {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Roster commands
#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Register one user
    Add {
        /// RUT in any formatting
        rut: String,
        /// Display name
        name: String,
        /// Class or group
        group: String,
    },

    /// List every user
    List,

    /// Find a user by RUT
    Find {
        /// RUT in any formatting
        rut: String,
    },

    /// Block a user from receiving tickets
    Block {
        /// User id
        id: u64,
    },

    /// Allow a blocked user to receive tickets again
    Unblock {
        /// User id
        id: u64,
    },

    /// Change a user's display name
    Rename {
        /// User id
        id: u64,
        /// New display name
        name: String,
    },

    /// Delete a user; their tickets are kept
    Delete {
        /// User id
        id: u64,
    },
}

/// Ticket commands
#[derive(Subcommand, Debug)]
pub enum TicketsCommand {
    /// List tickets, optionally for one date
    List {
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List today's tickets
    Today,

    /// Export tickets to CSV
    Export {
        /// Only tickets issued on this date (YYYY-MM-DD); all tickets otherwise
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output file; defaults to tickets_dd-mm-yyyy.csv in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
