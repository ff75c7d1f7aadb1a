//! # Ticketera
//!
//! School lunch-ticket kiosk. Students claim at most one ticket per day by
//! typing their RUT; administrators manage the roster and export the day's
//! tickets, all from the `ticketera` command line.
//!
//! This crate wires the [`ticketera_ledger::Ledger`] to the outside world:
//!
//! - [`config`]: environment-driven configuration
//! - [`auth`]: the shared-secret administrator gate
//! - [`receipt`]: the printable receipt
//! - [`kiosk`]: the command layer used by the CLI
//! - [`cli`] and [`handler`]: argument parsing and output

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod handler;
pub mod kiosk;
pub mod receipt;

pub use auth::{AdminGate, Denial};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::{Config, ConfigError};
pub use error::{EXIT_FAILURE, EXIT_NOTICE, EXIT_OK, KioskError, KioskResult};
pub use kiosk::{Claim, CsvExport, Kiosk};
pub use receipt::{ReceiptConfig, render_receipt};
