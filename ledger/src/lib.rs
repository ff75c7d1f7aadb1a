//! # Ticketera Ledger
//!
//! The stateful half of the lunch-ticket kiosk: the user roster, the ticket
//! history and the one-ticket-per-day rule, plus the file-backed store and
//! the CSV layout used to move rosters and tickets in and out.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use ticketera_core::environment::SystemClock;
//! use ticketera_ledger::{FileStore, Ledger, LedgerEnvironment};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dir = tempfile::tempdir()?;
//! let store = FileStore::open(dir.path())?;
//! let mut ledger = Ledger::open(LedgerEnvironment::new(Arc::new(SystemClock), Arc::new(store)))?;
//!
//! ledger.create_user("12.345.678-5", "Ana Rojas", "1A")?;
//! let ticket = ledger.claim_ticket("12345678-5")?;
//! assert_eq!(ticket.name, "Ana Rojas");
//! assert!(ledger.claim_ticket("12.345.678-5").is_err());
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod file_store;
pub mod ledger;

pub use csv::{CsvError, export_file_name, export_tickets_csv, parse_roster_csv};
pub use file_store::FileStore;
pub use ledger::{
    ImportReport, Ledger, LedgerEnvironment, LedgerState, LedgerSummary, LoadReport, Placeholders,
};
