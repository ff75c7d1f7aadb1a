//! Administrator gate.
//!
//! Administration is protected by one shared secret. There are no accounts,
//! roles or sessions: every administrative command presents the secret and
//! is checked on its own.

use std::fmt;
use tracing::warn;

/// Why the gate refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No secret is configured, so administration is disabled
    Disabled,
    /// The presented secret was missing or wrong
    Rejected,
}

/// Checks the shared administrator secret
#[derive(Clone, Default)]
pub struct AdminGate {
    secret: Option<String>,
}

impl AdminGate {
    /// Creates a gate. `None` or an empty secret disables administration.
    #[must_use]
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    /// `true` if a secret is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks `presented` against the configured secret.
    ///
    /// The comparison takes the same time wherever the first mismatching
    /// byte is.
    ///
    /// # Errors
    ///
    /// Returns [`Denial::Disabled`] when no secret is configured and
    /// [`Denial::Rejected`] when `presented` is absent or does not match.
    pub fn authorize(&self, presented: Option<&str>) -> Result<(), Denial> {
        let Some(secret) = self.secret.as_deref() else {
            warn!("Administrative command refused: no administrator password configured");
            return Err(Denial::Disabled);
        };

        let matches = presented.is_some_and(|given| {
            constant_time_eq::constant_time_eq(given.as_bytes(), secret.as_bytes())
        });
        if matches {
            Ok(())
        } else {
            warn!("Administrative command refused: wrong password");
            Err(Denial::Rejected)
        }
    }
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_configured_secret() {
        let gate = AdminGate::new(Some("admin123".to_string()));
        assert!(gate.is_enabled());
        assert_eq!(gate.authorize(Some("admin123")), Ok(()));
        assert_eq!(gate.authorize(Some("admin124")), Err(Denial::Rejected));
        assert_eq!(gate.authorize(Some("admin1234")), Err(Denial::Rejected));
        assert_eq!(gate.authorize(Some("")), Err(Denial::Rejected));
        assert_eq!(gate.authorize(None), Err(Denial::Rejected));
    }

    #[test]
    fn unset_secret_disables_administration() {
        for gate in [AdminGate::new(None), AdminGate::new(Some(String::new()))] {
            assert!(!gate.is_enabled());
            assert_eq!(gate.authorize(Some("")), Err(Denial::Disabled));
            assert_eq!(gate.authorize(None), Err(Denial::Disabled));
        }
    }

    #[test]
    fn debug_hides_secret() {
        let gate = AdminGate::new(Some("admin123".to_string()));
        assert!(!format!("{gate:?}").contains("admin123"));
    }
}
