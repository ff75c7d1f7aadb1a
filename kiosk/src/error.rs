//! Kiosk error types.

use crate::auth::Denial;
use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;
use ticketera_core::error::{ErrorKind, LedgerError, StorageError};
use ticketera_core::rut::RutError;
use ticketera_core::types::UserId;
use ticketera_ledger::CsvError;

/// Exit code for success
pub const EXIT_OK: u8 = 0;
/// Exit code for failures
pub const EXIT_FAILURE: u8 = 1;
/// Exit code for notices, such as a second claim on the same day
pub const EXIT_NOTICE: u8 = 2;

/// Errors surfaced by kiosk commands
#[derive(Error, Debug)]
pub enum KioskError {
    /// A ledger operation failed or was refused
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The identifier given to an administrative command is invalid
    #[error("Invalid identifier: {0}")]
    InvalidIdentity(#[from] RutError),

    /// The identifier is already on the roster
    #[error("Identifier {0} is already registered")]
    DuplicateIdentity(String),

    /// No user has this id
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Administration is disabled because no password is configured
    #[error("Administration is disabled: set TICKETERA_ADMIN_PASSWORD")]
    AdminDisabled,

    /// The administrator password was missing or wrong
    #[error("Unauthorized: wrong administrator password")]
    Unauthorized,

    /// A destructive command was run without confirmation
    #[error("Refusing to {0} without --yes")]
    ConfirmationRequired(&'static str),

    /// The roster file could not be parsed
    #[error("Invalid roster file: {0}")]
    Csv(#[from] CsvError),

    /// Configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Reading or writing a file failed
    #[error("Cannot access {}: {source}", path.display())]
    File {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Writing command output failed
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl From<StorageError> for KioskError {
    fn from(err: StorageError) -> Self {
        Self::Ledger(LedgerError::Persistence(err))
    }
}

impl From<Denial> for KioskError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Disabled => Self::AdminDisabled,
            Denial::Rejected => Self::Unauthorized,
        }
    }
}

impl KioskError {
    /// `true` for outcomes shown as a notice rather than a failure
    #[must_use]
    pub const fn is_notice(&self) -> bool {
        match self {
            Self::Ledger(err) => err.is_notice(),
            _ => false,
        }
    }

    /// Coarse classification, when the error came from the ledger or the
    /// identifier check
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Ledger(err) => Some(err.kind()),
            Self::InvalidIdentity(_) => Some(ErrorKind::InvalidFormat),
            Self::UserNotFound(_) => Some(ErrorKind::NotFound),
            _ => None,
        }
    }

    /// Process exit code for this error
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        if self.is_notice() {
            EXIT_NOTICE
        } else {
            EXIT_FAILURE
        }
    }
}

/// Result alias for kiosk commands
pub type KioskResult<T> = Result<T, KioskError>;
