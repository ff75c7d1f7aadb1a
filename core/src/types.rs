//! Domain types for the lunch-ticket ledger.
//!
//! Users are the roster of people allowed to claim a ticket. Tickets are
//! self-contained historical records: they copy the user's identity, name
//! and group at issuance time so they stay readable after the user is
//! edited or deleted.
//!
//! Persisted records also accept the field names written by the legacy
//! browser store, so an old dump loads without conversion.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First id handed out to users on a fresh ledger.
pub const FIRST_USER_ID: u64 = 1;

/// First id handed out to tickets on a fresh ledger.
///
/// The offset keeps ticket numbers visually distinct from user ids.
pub const FIRST_TICKET_ID: u64 = 200_000;

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Creates a `UserId` from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(u64);

impl TicketId {
    /// Creates a `TicketId` from its numeric value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Number printed on the receipt, zero-padded to six digits
    #[must_use]
    pub fn receipt_number(self) -> String {
        format!("{:06}", self.0)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A person on the roster
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, never reused
    pub id: UserId,
    /// Canonical identifier (digits plus lowercase check character)
    #[serde(alias = "rut")]
    pub identity: String,
    /// Display name
    #[serde(alias = "nombre")]
    pub name: String,
    /// Class or group the user belongs to
    #[serde(alias = "curso")]
    pub group: String,
    /// Blocked users cannot receive new tickets
    #[serde(alias = "bloqueado", default)]
    pub blocked: bool,
    /// When the user was created
    #[serde(alias = "fecha_creacion")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a new, unblocked user
    #[must_use]
    pub const fn new(
        id: UserId,
        identity: String,
        name: String,
        group: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            identity,
            name,
            group,
            blocked: false,
            created_at,
        }
    }

    /// Applies a patch in place
    pub fn apply(&mut self, patch: UserPatch) {
        match patch {
            UserPatch::SetBlocked(blocked) => self.blocked = blocked,
            UserPatch::Rename(name) => self.name = name,
            UserPatch::SetGroup(group) => self.group = group,
        }
    }
}

/// An issued lunch ticket
///
/// `identity`, `name` and `group` are a snapshot of the user at issuance
/// time. `user_id` is kept for lineage only and may point at a user that no
/// longer exists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier
    pub id: TicketId,
    /// User the ticket was issued to
    #[serde(alias = "usuario_id")]
    pub user_id: UserId,
    /// Canonical identifier of the user at issuance time
    #[serde(alias = "rut")]
    pub identity: String,
    /// Name of the user at issuance time
    #[serde(alias = "nombre", default)]
    pub name: String,
    /// Group of the user at issuance time
    #[serde(alias = "curso", default)]
    pub group: String,
    /// Local calendar date of issuance
    #[serde(alias = "fecha_emision")]
    pub issue_date: NaiveDate,
    /// Local time of day of issuance
    #[serde(alias = "hora_emision")]
    pub issue_time: NaiveTime,
    /// Exact instant of issuance
    #[serde(alias = "fecha_hora_completa")]
    pub issued_at: DateTime<Utc>,
}

impl Ticket {
    /// Returns `true` when the snapshot lacks a name or group
    ///
    /// Records written before snapshots existed load this way and are
    /// backfilled on load.
    #[must_use]
    pub fn needs_backfill(&self) -> bool {
        self.name.is_empty() || self.group.is_empty()
    }
}

/// A roster row to import
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Identifier in any formatting
    pub identity: String,
    /// Display name
    pub name: String,
    /// Class or group
    pub group: String,
}

impl NewUser {
    /// Creates a new import row
    pub fn new(
        identity: impl Into<String>,
        name: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into(),
            name: name.into(),
            group: group.into(),
        }
    }
}

/// The closed set of edits an administrator can make to a user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserPatch {
    /// Block or unblock ticket issuance
    SetBlocked(bool),
    /// Change the display name
    Rename(String),
    /// Move the user to another group
    SetGroup(String),
}
