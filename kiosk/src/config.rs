//! Configuration management for the kiosk.
//!
//! Loads configuration from environment variables with sensible defaults.
//! A `.env` file in the working directory is honored by the binary.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `TICKETERA_DATA_DIR` | `./data` |
//! | `TICKETERA_TIMEZONE` | `America/Santiago` |
//! | `TICKETERA_ADMIN_PASSWORD` | unset (administration disabled) |
//! | `TICKETERA_RECEIPT_TITLE` | `TICKETERA` |
//! | `TICKETERA_RECEIPT_FOOTER` | `Valid only on the day of issue` |
//! | `TICKETERA_DELETED_USER_NAME` | `Deleted user` |
//! | `TICKETERA_UNKNOWN_GROUP` | `Unknown group` |

use crate::receipt::ReceiptConfig;
use chrono_tz::Tz;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use ticketera_core::environment::DEFAULT_TIMEZONE;
use ticketera_ledger::Placeholders;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `TICKETERA_TIMEZONE` is not an IANA zone name
    #[error("Invalid timezone {value:?}: {reason}")]
    InvalidTimezone {
        /// Value as given
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Directory holding the persisted collections
    pub data_dir: PathBuf,
    /// Zone in which calendar days are counted
    pub timezone: Tz,
    /// Shared administrator secret; administration is refused when `None`
    pub admin_password: Option<String>,
    /// Printed receipt text
    pub receipt: ReceiptConfig,
    /// Text for tickets whose user no longer exists
    pub placeholders: Placeholders,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a variable is set to an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timezone = match get("TICKETERA_TIMEZONE") {
            Some(value) => match value.trim().parse::<Tz>() {
                Ok(tz) => tz,
                Err(e) => {
                    return Err(ConfigError::InvalidTimezone {
                        reason: e.to_string(),
                        value,
                    });
                }
            },
            None => DEFAULT_TIMEZONE,
        };

        let receipt_defaults = ReceiptConfig::default();
        let placeholder_defaults = Placeholders::default();

        Ok(Self {
            data_dir: get("TICKETERA_DATA_DIR")
                .map_or_else(|| PathBuf::from("./data"), PathBuf::from),
            timezone,
            admin_password: get("TICKETERA_ADMIN_PASSWORD"),
            receipt: ReceiptConfig {
                title: get("TICKETERA_RECEIPT_TITLE").unwrap_or(receipt_defaults.title),
                footer: get("TICKETERA_RECEIPT_FOOTER").unwrap_or(receipt_defaults.footer),
            },
            placeholders: Placeholders {
                deleted_user_name: get("TICKETERA_DELETED_USER_NAME")
                    .unwrap_or(placeholder_defaults.deleted_user_name),
                unknown_group: get("TICKETERA_UNKNOWN_GROUP")
                    .unwrap_or(placeholder_defaults.unknown_group),
            },
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("data_dir", &self.data_dir)
            .field("timezone", &self.timezone)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .field("receipt", &self.receipt)
            .field("placeholders", &self.placeholders)
            .finish()
    }
}
