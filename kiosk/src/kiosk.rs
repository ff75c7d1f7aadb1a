//! Kiosk command layer.
//!
//! [`Kiosk`] wraps a [`Ledger`] with the two audiences the kiosk serves:
//!
//! - **Students** claim today's ticket by typing their RUT. No password.
//! - **Administrators** manage the roster and export tickets. Every
//!   administrative method takes the presented password and checks it
//!   through the [`AdminGate`] before touching the ledger.

use crate::auth::AdminGate;
use crate::config::Config;
use crate::error::{KioskError, KioskResult};
use crate::receipt::{ReceiptConfig, render_receipt};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use ticketera_core::environment::Clock;
use ticketera_core::error::LedgerError;
use ticketera_core::rut::Rut;
use ticketera_core::types::{Ticket, User, UserId};
use ticketera_ledger::{
    FileStore, ImportReport, Ledger, LedgerEnvironment, LedgerSummary, export_file_name,
    export_tickets_csv, parse_roster_csv,
};
use tracing::info;

/// A successful claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// The issued ticket
    pub ticket: Ticket,
    /// Printable receipt for the ticket
    pub receipt: String,
}

/// A rendered ticket export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvExport {
    /// Suggested file name, `tickets_dd-mm-yyyy.csv`
    pub file_name: String,
    /// Number of tickets exported
    pub tickets: usize,
    /// File contents
    pub contents: String,
}

/// Ledger plus access control and receipt printing
#[derive(Debug)]
pub struct Kiosk {
    ledger: Ledger,
    gate: AdminGate,
    receipt: ReceiptConfig,
}

impl Kiosk {
    /// Creates a kiosk around an already loaded ledger
    #[must_use]
    pub const fn new(ledger: Ledger, gate: AdminGate, receipt: ReceiptConfig) -> Self {
        Self {
            ledger,
            gate,
            receipt,
        }
    }

    /// Opens the file-backed ledger described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Ledger`] if the data directory cannot be
    /// created or the stored collections cannot be read.
    pub fn open(config: &Config, clock: Arc<dyn Clock>) -> KioskResult<Self> {
        let store = FileStore::open(&config.data_dir)?;
        let env = LedgerEnvironment::new(clock, Arc::new(store))
            .with_timezone(config.timezone)
            .with_placeholders(config.placeholders.clone());
        let ledger = Ledger::open(env)?;
        info!(data_dir = %config.data_dir.display(), timezone = %config.timezone, "Kiosk ready");

        Ok(Self::new(
            ledger,
            AdminGate::new(config.admin_password.clone()),
            config.receipt.clone(),
        ))
    }

    /// The wrapped ledger
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ========== Student operations ==========

    /// Claims today's ticket and renders its receipt.
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Ledger`] carrying the refusal reason; see
    /// [`Ledger::claim_ticket`]. A second claim on the same day is a notice
    /// ([`KioskError::is_notice`]).
    pub fn claim(&mut self, raw_identity: &str) -> KioskResult<Claim> {
        let ticket = self.ledger.claim_ticket(raw_identity)?;
        let receipt = render_receipt(&ticket, &self.receipt);
        Ok(Claim { ticket, receipt })
    }

    /// Reports whether a claim would succeed, without issuing anything.
    ///
    /// # Errors
    ///
    /// Returns the same refusals as [`Kiosk::claim`], except persistence
    /// failures, which cannot happen here.
    pub fn check(&self, raw_identity: &str) -> KioskResult<&User> {
        let rut = Rut::parse(raw_identity).map_err(LedgerError::from)?;
        let user = self
            .ledger
            .find_user_by_identity(rut.as_str())
            .ok_or_else(|| LedgerError::UnknownIdentity(rut.as_str().to_string()))?;
        if user.blocked {
            return Err(LedgerError::UserBlocked { user_id: user.id }.into());
        }
        if self.ledger.has_ticket_today(rut.as_str()) {
            return Err(LedgerError::AlreadyIssuedToday {
                identity: rut.into_inner(),
                date: self.ledger.today(),
            }
            .into());
        }
        Ok(user)
    }

    // ========== Administrator operations ==========

    fn authorize(&self, password: Option<&str>) -> KioskResult<()> {
        self.gate.authorize(password).map_err(KioskError::from)
    }

    fn existing(user: Option<User>, id: UserId) -> KioskResult<User> {
        user.ok_or(KioskError::UserNotFound(id))
    }

    /// Registers one user after validating the identifier.
    ///
    /// # Errors
    ///
    /// - [`KioskError::Unauthorized`] / [`KioskError::AdminDisabled`]
    /// - [`KioskError::InvalidIdentity`] if the checksum fails
    /// - [`KioskError::DuplicateIdentity`] if the identifier is taken
    /// - [`KioskError::Ledger`] if the write fails
    pub fn add_user(
        &mut self,
        password: Option<&str>,
        identity: &str,
        name: &str,
        group: &str,
    ) -> KioskResult<User> {
        self.authorize(password)?;
        let rut = Rut::parse(identity)?;
        if self.ledger.find_user_by_identity(rut.as_str()).is_some() {
            return Err(KioskError::DuplicateIdentity(rut.to_string()));
        }
        Ok(self
            .ledger
            .create_user(rut.as_str(), name.trim(), group.trim())?)
    }

    /// Every user in creation order
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Unauthorized`] / [`KioskError::AdminDisabled`].
    pub fn users(&self, password: Option<&str>) -> KioskResult<&[User]> {
        self.authorize(password)?;
        Ok(self.ledger.list_users())
    }

    /// Looks up a user by identifier in any formatting
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Unauthorized`] / [`KioskError::AdminDisabled`].
    pub fn find(&self, password: Option<&str>, identity: &str) -> KioskResult<Option<&User>> {
        self.authorize(password)?;
        Ok(self.ledger.find_user_by_identity(identity))
    }

    /// Blocks or unblocks a user
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::UserNotFound`] for an unknown id, plus the
    /// authorization and persistence errors of every admin command.
    pub fn set_blocked(
        &mut self,
        password: Option<&str>,
        id: UserId,
        blocked: bool,
    ) -> KioskResult<User> {
        self.authorize(password)?;
        Self::existing(self.ledger.set_blocked(id, blocked)?, id)
    }

    /// Renames a user
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::UserNotFound`] for an unknown id, plus the
    /// authorization and persistence errors of every admin command.
    pub fn rename(&mut self, password: Option<&str>, id: UserId, name: &str) -> KioskResult<User> {
        self.authorize(password)?;
        Self::existing(self.ledger.rename(id, name.trim())?, id)
    }

    /// Deletes a user. Their tickets stay in the history.
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::UserNotFound`] for an unknown id, plus the
    /// authorization and persistence errors of every admin command.
    pub fn delete_user(&mut self, password: Option<&str>, id: UserId) -> KioskResult<()> {
        self.authorize(password)?;
        if self.ledger.delete_user(id)? {
            Ok(())
        } else {
            Err(KioskError::UserNotFound(id))
        }
    }

    /// Tickets for one date, or the whole history when `date` is `None`
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Unauthorized`] / [`KioskError::AdminDisabled`].
    pub fn tickets(
        &self,
        password: Option<&str>,
        date: Option<NaiveDate>,
    ) -> KioskResult<Vec<&Ticket>> {
        self.authorize(password)?;
        Ok(match date {
            Some(date) => self.ledger.tickets_for_date(Some(date)),
            None => self.ledger.list_tickets().iter().collect(),
        })
    }

    /// Imports a roster file's text
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Csv`] if the text is too short to hold a data
    /// row, plus the authorization and persistence errors of every admin
    /// command.
    pub fn import_csv(&mut self, password: Option<&str>, text: &str) -> KioskResult<ImportReport> {
        self.authorize(password)?;
        let rows = parse_roster_csv(text)?;
        Ok(self.ledger.import_users(rows)?)
    }

    /// Renders tickets for `date` as CSV, or the whole history when `date`
    /// is `None`. The file name carries `date`, or today for a full export.
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Unauthorized`] / [`KioskError::AdminDisabled`].
    pub fn export_csv(
        &self,
        password: Option<&str>,
        date: Option<NaiveDate>,
    ) -> KioskResult<CsvExport> {
        let tickets = self.tickets(password, date)?;
        let file_name = export_file_name(date.unwrap_or_else(|| self.ledger.today()));
        info!(file_name = %file_name, tickets = tickets.len(), "Exported tickets");
        Ok(CsvExport {
            file_name,
            tickets: tickets.len(),
            contents: export_tickets_csv(tickets),
        })
    }

    /// Removes every user, keeping the ticket history
    ///
    /// # Errors
    ///
    /// Returns the authorization and persistence errors of every admin command.
    pub fn clear_users(&mut self, password: Option<&str>) -> KioskResult<()> {
        self.authorize(password)?;
        Ok(self.ledger.clear_users_only()?)
    }

    /// Removes every user and ticket
    ///
    /// # Errors
    ///
    /// Returns the authorization and persistence errors of every admin command.
    pub fn clear_all(&mut self, password: Option<&str>) -> KioskResult<()> {
        self.authorize(password)?;
        Ok(self.ledger.clear_all()?)
    }

    /// Dashboard counters
    ///
    /// # Errors
    ///
    /// Returns [`KioskError::Unauthorized`] / [`KioskError::AdminDisabled`].
    pub fn summary(&self, password: Option<&str>) -> KioskResult<LedgerSummary> {
        self.authorize(password)?;
        Ok(self.ledger.summary())
    }
}
