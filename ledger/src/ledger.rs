//! The ticket ledger: user roster plus daily ticket history.
//!
//! The ledger enforces one ticket per identity per local calendar day. It
//! compares identities only after normalization, so `12.345.678-5` and
//! `123456785` are the same person everywhere.
//!
//! Every mutation is written through to the [`KeyValueStore`] in full. A
//! failed write is reported as [`LedgerError::Persistence`] and the
//! in-memory change is kept; the next successful write brings storage back
//! in line.
//!
//! # Issuing tickets
//!
//! [`Ledger::claim_ticket`] is the single call a kiosk should use: it
//! validates the identifier, resolves the user, refuses blocked users and
//! second claims, and issues, all inside one `&mut self` borrow. The
//! lower-level [`Ledger::has_ticket_today`] / [`Ledger::issue_ticket`] pair
//! is kept for administrative tooling; a caller that uses it must check
//! immediately before issuing.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use ticketera_core::environment::{self, Clock, DEFAULT_TIMEZONE};
use ticketera_core::error::LedgerError;
use ticketera_core::rut::{self, Rut};
use ticketera_core::storage::{self, KeyValueStore, TICKETS_KEY, USERS_KEY};
use ticketera_core::types::{
    FIRST_TICKET_ID, FIRST_USER_ID, NewUser, Ticket, TicketId, User, UserId, UserPatch,
};
use tracing::{debug, info, warn};

/// Result alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Text written into migrated tickets whose user no longer exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    /// Name used when the ticket's user cannot be found
    pub deleted_user_name: String,
    /// Group used when the ticket's user cannot be found
    pub unknown_group: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            deleted_user_name: "Deleted user".to_string(),
            unknown_group: "Unknown group".to_string(),
        }
    }
}

/// Environment dependencies for the ledger
#[derive(Clone)]
pub struct LedgerEnvironment {
    /// Clock for timestamps and the current calendar day
    pub clock: Arc<dyn Clock>,
    /// Persistence backend
    pub store: Arc<dyn KeyValueStore>,
    /// Zone in which calendar days are counted
    pub timezone: Tz,
    /// Text for tickets migrated without a matching user
    pub placeholders: Placeholders,
}

impl LedgerEnvironment {
    /// Creates an environment with the default zone and placeholders
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            store,
            timezone: DEFAULT_TIMEZONE,
            placeholders: Placeholders::default(),
        }
    }

    /// Sets the zone in which calendar days are counted
    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    /// Sets the migration placeholders
    #[must_use]
    pub fn with_placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }
}

impl fmt::Debug for LedgerEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerEnvironment")
            .field("timezone", &self.timezone)
            .field("placeholders", &self.placeholders)
            .finish_non_exhaustive()
    }
}

/// In-memory contents of the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    /// Current roster, in creation order
    pub users: Vec<User>,
    /// Every ticket ever issued, in issuance order
    pub tickets: Vec<Ticket>,
    /// Id the next created user receives
    pub next_user_id: u64,
    /// Id the next issued ticket receives
    pub next_ticket_id: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            tickets: Vec::new(),
            next_user_id: FIRST_USER_ID,
            next_ticket_id: FIRST_TICKET_ID,
        }
    }
}

/// What [`Ledger::load`] found in storage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Users loaded
    pub users: usize,
    /// Tickets loaded
    pub tickets: usize,
    /// Tickets whose missing name or group was backfilled
    pub migrated_tickets: usize,
}

/// Outcome of [`Ledger::import_users`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Rows that created a new user
    pub created: usize,
    /// Rows skipped because the identity was already on the roster
    pub skipped: usize,
}

/// Counters shown on the administration dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    /// Users on the roster
    pub users: usize,
    /// Users currently blocked
    pub blocked_users: usize,
    /// Tickets in the history
    pub tickets: usize,
    /// Tickets issued today
    pub tickets_today: usize,
}

/// User roster and ticket history with write-through persistence
pub struct Ledger {
    state: LedgerState,
    env: LedgerEnvironment,
}

impl Ledger {
    /// Creates an empty ledger. Nothing is read from storage.
    #[must_use]
    pub fn new(env: LedgerEnvironment) -> Self {
        Self {
            state: LedgerState::default(),
            env,
        }
    }

    /// Creates a ledger and loads it from storage.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if storage cannot be read or holds
    /// malformed collections.
    pub fn open(env: LedgerEnvironment) -> Result<Self> {
        let mut ledger = Self::new(env);
        ledger.load()?;
        Ok(ledger)
    }

    /// Replaces in-memory state with what is persisted.
    ///
    /// Counters resume after the highest stored ids. Tickets stored without a
    /// name or group are backfilled from the current roster, or from the
    /// configured placeholders when their user is gone. Loading never writes;
    /// backfilled values reach storage with the next mutation.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if storage cannot be read or holds
    /// malformed collections. State is left untouched in that case.
    pub fn load(&mut self) -> Result<LoadReport> {
        let store = self.env.store.as_ref();
        let users: Option<Vec<User>> = storage::load_collection(store, USERS_KEY)?;
        let tickets: Option<Vec<Ticket>> = storage::load_collection(store, TICKETS_KEY)?;

        let mut state = LedgerState::default();
        let mut report = LoadReport::default();

        if let Some(users) = users {
            state.next_user_id = users.iter().map(|u| u.id.get()).max().unwrap_or(0) + 1;
            state.users = users;
        }

        if let Some(mut tickets) = tickets {
            report.migrated_tickets =
                backfill_snapshots(&mut tickets, &state.users, &self.env.placeholders);
            state.next_ticket_id = tickets
                .iter()
                .map(|t| t.id.get())
                .max()
                .unwrap_or(0)
                .max(FIRST_TICKET_ID - 1)
                + 1;
            state.tickets = tickets;
        }

        report.users = state.users.len();
        report.tickets = state.tickets.len();
        if report.migrated_tickets > 0 {
            warn!(
                migrated = report.migrated_tickets,
                "Backfilled name/group on legacy tickets"
            );
        }
        info!(
            users = report.users,
            tickets = report.tickets,
            next_user_id = state.next_user_id,
            next_ticket_id = state.next_ticket_id,
            "Ledger loaded"
        );

        self.state = state;
        Ok(report)
    }

    /// Writes both collections to storage, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if either write fails.
    pub fn flush(&self) -> Result<()> {
        let store = self.env.store.as_ref();
        storage::save_collection(store, USERS_KEY, &self.state.users)?;
        storage::save_collection(store, TICKETS_KEY, &self.state.tickets)?;
        Ok(())
    }

    fn persist(&self, operation: &'static str) -> Result<()> {
        self.flush().inspect_err(|error| {
            warn!(operation, %error, "Failed to persist ledger; in-memory state kept");
        })
    }

    /// Read-only view of the in-memory state
    #[must_use]
    pub const fn state(&self) -> &LedgerState {
        &self.state
    }

    /// Today's date in the configured zone
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        environment::local_date(self.env.clock.now(), self.env.timezone)
    }

    // ========== Users ==========

    fn push_user(&mut self, identity: &str, name: String, group: String) -> User {
        let user = User::new(
            UserId::new(self.state.next_user_id),
            rut::normalize(identity),
            name,
            group,
            self.env.clock.now(),
        );
        self.state.next_user_id += 1;
        self.state.users.push(user.clone());
        info!(user_id = %user.id, identity = %user.identity, group = %user.group, "Created user");
        user
    }

    /// Adds a user with the next id. The identity is stored normalized.
    ///
    /// No uniqueness check is made here; [`Ledger::import_users`] is the
    /// path that skips identities already on the roster.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails. The user is
    /// still added in memory.
    pub fn create_user(
        &mut self,
        identity: &str,
        name: impl Into<String>,
        group: impl Into<String>,
    ) -> Result<User> {
        let user = self.push_user(identity, name.into(), group.into());
        self.persist("create_user")?;
        Ok(user)
    }

    /// First user whose normalized identity matches, if any.
    ///
    /// Stored identities are normalized again before comparing, so records
    /// written unnormalized by older versions still match.
    #[must_use]
    pub fn find_user_by_identity(&self, identity: &str) -> Option<&User> {
        let wanted = rut::normalize(identity);
        let found = self
            .state
            .users
            .iter()
            .find(|u| rut::normalize(&u.identity) == wanted);
        debug!(identity = %wanted, found = found.is_some(), "Looked up user by identity");
        found
    }

    /// User with the given id, if any
    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.state.users.iter().find(|u| u.id == id)
    }

    /// All users in creation order
    #[must_use]
    pub fn list_users(&self) -> &[User] {
        &self.state.users
    }

    /// Applies `patch` to the user with `id`. Returns `None` for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails.
    pub fn update_user(&mut self, id: UserId, patch: UserPatch) -> Result<Option<User>> {
        let Some(user) = self.state.users.iter_mut().find(|u| u.id == id) else {
            debug!(user_id = %id, "Update skipped: no such user");
            return Ok(None);
        };

        user.apply(patch);
        let updated = user.clone();
        info!(user_id = %id, blocked = updated.blocked, "Updated user");

        self.persist("update_user")?;
        Ok(Some(updated))
    }

    /// Blocks or unblocks ticket issuance for a user
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails.
    pub fn set_blocked(&mut self, id: UserId, blocked: bool) -> Result<Option<User>> {
        self.update_user(id, UserPatch::SetBlocked(blocked))
    }

    /// Changes a user's display name. Tickets already issued keep the old name.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails.
    pub fn rename(&mut self, id: UserId, name: impl Into<String>) -> Result<Option<User>> {
        self.update_user(id, UserPatch::Rename(name.into()))
    }

    /// Removes a user. Returns `false` for an unknown id.
    ///
    /// Tickets issued to the user are left untouched and stay readable.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails.
    pub fn delete_user(&mut self, id: UserId) -> Result<bool> {
        let Some(index) = self.state.users.iter().position(|u| u.id == id) else {
            debug!(user_id = %id, "Delete skipped: no such user");
            return Ok(false);
        };

        let removed = self.state.users.remove(index);
        let kept = self
            .state
            .tickets
            .iter()
            .filter(|t| t.user_id == removed.id)
            .count();
        info!(user_id = %id, tickets_kept = kept, "Deleted user");

        self.persist("delete_user")?;
        Ok(true)
    }

    /// Adds every row whose identity is not yet on the roster, in row order.
    ///
    /// Rows are assumed to be pre-validated. Storage is written once at the
    /// end, and only if something was created.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails. Created users
    /// are still added in memory.
    pub fn import_users(
        &mut self,
        rows: impl IntoIterator<Item = NewUser>,
    ) -> Result<ImportReport> {
        let mut report = ImportReport::default();

        for row in rows {
            if self.find_user_by_identity(&row.identity).is_some() {
                report.skipped += 1;
                continue;
            }
            self.push_user(&row.identity, row.name, row.group);
            report.created += 1;
        }

        info!(
            created = report.created,
            skipped = report.skipped,
            "Imported users"
        );
        if report.created > 0 {
            self.persist("import_users")?;
        }
        Ok(report)
    }

    /// Removes every user and restarts user ids. Tickets are kept.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails.
    pub fn clear_users_only(&mut self) -> Result<()> {
        let removed = self.state.users.len();
        self.state.users.clear();
        self.state.next_user_id = FIRST_USER_ID;
        info!(
            removed,
            tickets_kept = self.state.tickets.len(),
            "Cleared all users"
        );
        self.persist("clear_users_only")
    }

    /// Removes every user and ticket and restarts both counters.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the write fails.
    pub fn clear_all(&mut self) -> Result<()> {
        self.state = LedgerState::default();
        info!("Cleared all users and tickets");
        self.persist("clear_all")
    }

    // ========== Tickets ==========

    /// `true` if a ticket exists for the normalized identity on `date`
    #[must_use]
    pub fn has_ticket_on(&self, identity: &str, date: NaiveDate) -> bool {
        let wanted = rut::normalize(identity);
        self.state
            .tickets
            .iter()
            .any(|t| t.issue_date == date && rut::normalize(&t.identity) == wanted)
    }

    /// `true` if a ticket was already issued to the identity today
    #[must_use]
    pub fn has_ticket_today(&self, identity: &str) -> bool {
        let today = self.today();
        let issued = self.has_ticket_on(identity, today);
        debug!(identity = %rut::normalize(identity), %today, issued, "Checked daily ticket");
        issued
    }

    /// Issues a ticket to `user_id`, snapshotting the user's name and group.
    ///
    /// This does not check the one-per-day rule; call
    /// [`Ledger::has_ticket_today`] immediately before, or use
    /// [`Ledger::claim_ticket`].
    ///
    /// # Errors
    ///
    /// - [`LedgerError::UserNotFound`] if `user_id` is not a current user
    /// - [`LedgerError::Persistence`] if the write fails (the ticket is still
    ///   recorded in memory)
    pub fn issue_ticket(&mut self, user_id: UserId, identity: &str) -> Result<Ticket> {
        let now = self.env.clock.now();
        self.issue_at(user_id, identity, now)
    }

    fn issue_at(&mut self, user_id: UserId, identity: &str, now: DateTime<Utc>) -> Result<Ticket> {
        let Some(user) = self.user(user_id) else {
            warn!(user_id = %user_id, "Cannot issue ticket: no such user");
            return Err(LedgerError::UserNotFound(user_id));
        };

        let ticket = Ticket {
            id: TicketId::new(self.state.next_ticket_id),
            user_id,
            identity: rut::normalize(identity),
            name: user.name.clone(),
            group: user.group.clone(),
            issue_date: environment::local_date(now, self.env.timezone),
            issue_time: environment::local_time(now, self.env.timezone),
            issued_at: now,
        };
        self.state.next_ticket_id += 1;
        self.state.tickets.push(ticket.clone());
        info!(
            ticket_id = %ticket.id,
            user_id = %user_id,
            date = %ticket.issue_date,
            "Issued ticket"
        );

        self.persist("issue_ticket")?;
        Ok(ticket)
    }

    /// Claims today's ticket for a raw identifier in one step.
    ///
    /// # Errors
    ///
    /// In order of checking:
    /// - [`LedgerError::InvalidFormat`] if the identifier fails validation
    /// - [`LedgerError::UnknownIdentity`] if no user has the identifier
    /// - [`LedgerError::UserBlocked`] if the user is blocked
    /// - [`LedgerError::AlreadyIssuedToday`] if a ticket exists for today
    /// - [`LedgerError::Persistence`] if the write fails
    pub fn claim_ticket(&mut self, raw_identity: &str) -> Result<Ticket> {
        let rut = Rut::parse(raw_identity).inspect_err(|error| {
            debug!(%error, "Rejected identifier");
        })?;

        let (user_id, blocked) = match self.find_user_by_identity(rut.as_str()) {
            Some(user) => (user.id, user.blocked),
            None => return Err(LedgerError::UnknownIdentity(rut.into_inner())),
        };
        if blocked {
            warn!(user_id = %user_id, "Refused ticket: user is blocked");
            return Err(LedgerError::UserBlocked { user_id });
        }

        let now = self.env.clock.now();
        let today = environment::local_date(now, self.env.timezone);
        if self.has_ticket_on(rut.as_str(), today) {
            info!(user_id = %user_id, %today, "Refused ticket: already issued today");
            return Err(LedgerError::AlreadyIssuedToday {
                identity: rut.into_inner(),
                date: today,
            });
        }

        self.issue_at(user_id, rut.as_str(), now)
    }

    /// Tickets issued on `date`, or today when `None`
    #[must_use]
    pub fn tickets_for_date(&self, date: Option<NaiveDate>) -> Vec<&Ticket> {
        let date = date.unwrap_or_else(|| self.today());
        self.state
            .tickets
            .iter()
            .filter(|t| t.issue_date == date)
            .collect()
    }

    /// Every ticket in issuance order
    #[must_use]
    pub fn list_tickets(&self) -> &[Ticket] {
        &self.state.tickets
    }

    /// Dashboard counters
    #[must_use]
    pub fn summary(&self) -> LedgerSummary {
        let today = self.today();
        LedgerSummary {
            users: self.state.users.len(),
            blocked_users: self.state.users.iter().filter(|u| u.blocked).count(),
            tickets: self.state.tickets.len(),
            tickets_today: self
                .state
                .tickets
                .iter()
                .filter(|t| t.issue_date == today)
                .count(),
        }
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("users", &self.state.users.len())
            .field("tickets", &self.state.tickets.len())
            .field("next_user_id", &self.state.next_user_id)
            .field("next_ticket_id", &self.state.next_ticket_id)
            .field("env", &self.env)
            .finish()
    }
}

/// Fills in missing name/group on tickets from the roster, falling back to
/// placeholders. Returns how many tickets changed.
fn backfill_snapshots(
    tickets: &mut [Ticket],
    users: &[User],
    placeholders: &Placeholders,
) -> usize {
    let mut migrated = 0;
    for ticket in tickets.iter_mut().filter(|t| t.needs_backfill()) {
        let owner = users.iter().find(|u| u.id == ticket.user_id);
        if ticket.name.is_empty() {
            ticket.name = owner
                .map(|u| u.name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| placeholders.deleted_user_name.clone());
        }
        if ticket.group.is_empty() {
            ticket.group = owner
                .map(|u| u.group.clone())
                .filter(|group| !group.is_empty())
                .unwrap_or_else(|| placeholders.unknown_group.clone());
        }
        migrated += 1;
    }
    migrated
}
