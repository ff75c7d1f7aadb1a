//! # Ticketera Core
//!
//! Core types and pure logic for the school lunch-ticket kiosk.
//!
//! This crate provides the pieces every other crate builds on:
//!
//! - **Identity normalizer** ([`rut`]): parses, validates and formats Chilean
//!   RUT identifiers with the Module-11 checksum
//! - **Domain types** ([`types`]): users, tickets and the patches an
//!   administrator can apply
//! - **Environment** ([`environment`]): injected dependencies such as the clock
//! - **Storage** ([`storage`]): the key-value backend the ledger persists to
//! - **Errors** ([`error`]): the failure taxonomy shown to kiosk users
//!
//! ## Example
//!
//! ```
//! use ticketera_core::rut;
//!
//! let raw = "12.345.678-5";
//! assert!(rut::validate(raw));
//! assert_eq!(rut::normalize(raw), "123456785");
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
pub use chrono_tz::Tz;

pub mod error;
pub mod rut;
pub mod storage;
pub mod types;

pub use error::{ErrorKind, LedgerError, StorageError};
pub use rut::{Rut, RutError};
pub use storage::KeyValueStore;
pub use types::{NewUser, Ticket, TicketId, User, UserId, UserPatch};

/// Environment module - Dependency injection traits
///
/// External dependencies are abstracted behind traits so tests can swap them
/// for deterministic implementations.
pub mod environment {
    use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
    use chrono_tz::Tz;

    /// Zone used when none is configured.
    pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Santiago;

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use ticketera_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let before = clock.now();
    /// assert!(clock.now() >= before);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Local calendar date of `instant` in `timezone`
    #[must_use]
    pub fn local_date(instant: DateTime<Utc>, timezone: Tz) -> NaiveDate {
        instant.with_timezone(&timezone).date_naive()
    }

    /// Local time of day of `instant` in `timezone`, truncated to whole seconds
    #[must_use]
    pub fn local_time(instant: DateTime<Utc>, timezone: Tz) -> NaiveTime {
        let time = instant.with_timezone(&timezone).time();
        time.with_nanosecond(0).unwrap_or(time)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::environment::{DEFAULT_TIMEZONE, local_date, local_time};
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    #[test]
    fn local_date_follows_the_zone_not_utc() {
        // 01:30 UTC on the 4th is still the evening of the 3rd in Santiago.
        let instant = Utc.with_ymd_and_hms(2025, 3, 4, 1, 30, 0).unwrap();
        assert_eq!(
            local_date(instant, DEFAULT_TIMEZONE),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
        );
        assert_eq!(
            local_date(instant, chrono_tz::UTC),
            NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()
        );
    }

    #[test]
    fn local_time_drops_subseconds() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 2, 16, 5, 9).unwrap()
            + chrono::Duration::milliseconds(750);
        assert_eq!(
            local_time(instant, chrono_tz::UTC),
            NaiveTime::from_hms_opt(16, 5, 9).unwrap()
        );
    }
}
