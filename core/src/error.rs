//! Error types shared by the ledger and its callers.

use crate::rut::RutError;
use crate::types::UserId;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::storage::KeyValueStore) backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Reading or writing the underlying medium failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        /// Key being accessed
        key: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A stored collection could not be encoded or decoded.
    #[error("Serialization error on key {key}: {source}")]
    Serialization {
        /// Key being accessed
        key: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// The backend refused the operation for another reason.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Coarse classification of a [`LedgerError`], used by front ends to pick
/// how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The identifier failed validation; nothing was attempted.
    InvalidFormat,
    /// A lookup missed.
    NotFound,
    /// The user is blocked from receiving tickets.
    Blocked,
    /// The user already has a ticket for today. Expected and frequent.
    AlreadyIssuedToday,
    /// Persisted storage could not be read or written.
    PersistenceFailure,
}

/// Errors returned by ledger operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The identifier failed checksum or length validation.
    #[error("Invalid identifier: {0}")]
    InvalidFormat(#[from] RutError),

    /// No current user has this id.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// No current user has this identifier.
    #[error("No user registered with identifier {0}")]
    UnknownIdentity(String),

    /// The user is blocked from receiving tickets.
    #[error("User {user_id} is blocked")]
    UserBlocked {
        /// Blocked user
        user_id: UserId,
    },

    /// A ticket was already issued to this identifier today.
    #[error("A ticket was already issued to {identity} on {date}")]
    AlreadyIssuedToday {
        /// Canonical identifier
        identity: String,
        /// Local calendar date
        date: NaiveDate,
    },

    /// Persisted storage failed. In-memory state is not rolled back.
    #[error("Persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

impl LedgerError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFormat(_) => ErrorKind::InvalidFormat,
            Self::UserNotFound(_) | Self::UnknownIdentity(_) => ErrorKind::NotFound,
            Self::UserBlocked { .. } => ErrorKind::Blocked,
            Self::AlreadyIssuedToday { .. } => ErrorKind::AlreadyIssuedToday,
            Self::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }

    /// `true` for outcomes shown as a non-destructive notice rather than a failure.
    #[must_use]
    pub const fn is_notice(&self) -> bool {
        matches!(self, Self::AlreadyIssuedToday { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_taxonomy() {
        let invalid = LedgerError::from(RutError::TooShort("1".to_string()));
        assert_eq!(invalid.kind(), ErrorKind::InvalidFormat);

        assert_eq!(
            LedgerError::UserNotFound(UserId::new(9)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::UnknownIdentity("19".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::from(StorageError::Unavailable("quota".to_string())).kind(),
            ErrorKind::PersistenceFailure
        );
    }

    #[test]
    fn only_already_issued_is_a_notice() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let notice = LedgerError::AlreadyIssuedToday {
            identity: "19".to_string(),
            date,
        };
        assert!(notice.is_notice());
        assert!(!LedgerError::UserBlocked {
            user_id: UserId::new(1)
        }
        .is_notice());
    }
}
