//! # Ticketera Testing
//!
//! Testing utilities and helpers for the lunch-ticket kiosk.
//!
//! This crate provides:
//! - Deterministic implementations of Environment traits (clocks)
//! - In-memory and failure-injecting storage backends
//! - Golden identifiers and roster fixtures
//!
//! ## Example
//!
//! ```ignore
//! use ticketera_testing::{test_clock, InMemoryStore};
//!
//! let env = LedgerEnvironment::new(Arc::new(test_clock()), Arc::new(InMemoryStore::new()));
//! let mut ledger = Ledger::new(env);
//! let user = ledger.create_user("12.345.678-5", "Ana", "1A")?;
//! assert!(!ledger.has_ticket_today(&user.identity));
//! ```

use chrono::{DateTime, Duration, Utc};
use ticketera_core::environment::Clock;

pub mod store_mocks;

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Utc};
    use std::sync::{Arc, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use ticketera_testing::mocks::FixedClock;
    /// use ticketera_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so a test can keep a handle and advance
    /// the clock a ledger is holding.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a manual clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned.
        #[allow(clippy::unwrap_used)]
        pub fn advance(&self, by: Duration) {
            let mut time = self.time.write().unwrap();
            *time += by;
        }

        /// Move the clock forward by whole days
        pub fn advance_days(&self, days: i64) {
            self.advance(Duration::days(days));
        }

        /// Jump to an absolute time
        ///
        /// # Panics
        ///
        /// Panics if the lock is poisoned.
        #[allow(clippy::unwrap_used)]
        pub fn set(&self, time: DateTime<Utc>) {
            *self.time.write().unwrap() = time;
        }
    }

    impl Clock for ManualClock {
        #[allow(clippy::unwrap_used)]
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap()
        }
    }

    /// Create a default fixed clock for tests
    ///
    /// 2025-03-03 15:00:00 UTC, which is noon on a Monday in Santiago.
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_instant())
    }

    /// The instant [`test_clock`] is frozen at
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded timestamp fails to parse.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_instant() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-03T15:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }
}

/// Golden identifiers and roster fixtures
pub mod fixtures {
    use ticketera_core::types::NewUser;

    /// Valid identifiers in display form, with hand-computed check characters.
    ///
    /// Includes one whose check character is the letter (remainder 1) and
    /// two whose check character is `0` (remainder 0).
    pub const VALID_RUTS: &[&str] = &[
        "12.345.678-5",
        "1-9",
        "10.000.013-K",
        "10.000.004-0",
        "14-0",
        "9.876.543-3",
        "22.222.222-2",
        "20.123.456-5",
    ];

    /// Identifiers whose check character is wrong.
    pub const INVALID_RUTS: &[&str] = &["12.345.678-4", "10.000.013-0", "1-8", "9.876.543-K"];

    /// A small roster of three students with valid identifiers
    #[must_use]
    pub fn roster() -> Vec<NewUser> {
        vec![
            NewUser::new("12.345.678-5", "Ana Rojas", "1A"),
            NewUser::new("9.876.543-3", "Benjamín Soto", "2B"),
            NewUser::new("10.000.013-K", "Catalina Muñoz", "3C"),
        ]
    }
}

/// Property-based testing utilities
pub mod properties {
    use proptest::prelude::*;
    use ticketera_core::rut;

    /// Strategy producing valid identifiers in canonical form
    pub fn valid_rut() -> impl Strategy<Value = String> {
        "[1-9][0-9]{0,7}".prop_map(|body| {
            let check = rut::check_digit(&body).unwrap_or('0');
            format!("{body}{check}")
        })
    }

    /// Strategy producing display strings safe to embed in CSV fields
    pub fn csv_text() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 ]{0,20}[A-Za-z0-9]".prop_map(|s| s.trim().to_string())
    }
}

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from many tests; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticketera=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use fixtures::{INVALID_RUTS, VALID_RUTS, roster};
pub use mocks::{FixedClock, ManualClock, test_clock, test_instant};
pub use store_mocks::{FailingStore, InMemoryStore};
