//! Chilean national identifier (RUT) normalization and Module-11 validation.
//!
//! A RUT is a run of digits (the body) followed by one check character. The
//! check character is `0`-`9` or the letter `K`. Users type it in many shapes
//! (`12.345.678-5`, `12345678-5`, `123456785`), so every comparison in the
//! system goes through [`normalize`] first.
//!
//! # Example
//!
//! ```
//! use ticketera_core::rut::{self, Rut};
//!
//! assert_eq!(rut::normalize("12.345.678-5"), "123456785");
//! assert!(rut::validate("12.345.678-5"));
//! assert!(!rut::validate("12.345.678-4"));
//! assert_eq!(rut::format("123456785"), "12.345.678-5");
//!
//! let parsed = Rut::parse("10.000.013-k").unwrap();
//! assert_eq!(parsed.as_str(), "10000013k");
//! assert_eq!(parsed.to_string(), "10.000.013-K");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The letter used as check character when the Module-11 remainder is 1.
pub const CHECK_LETTER: char = 'k';

/// Weights cycle from 2 to 7, starting at the least significant digit.
const FIRST_WEIGHT: u32 = 2;
const LAST_WEIGHT: u32 = 7;

/// Reasons a raw identifier is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RutError {
    /// Fewer than two significant characters remain after normalization.
    #[error("identifier too short: {0:?}")]
    TooShort(String),

    /// The body contains something other than decimal digits.
    #[error("identifier body is not numeric: {0:?}")]
    MalformedBody(String),

    /// The supplied check character does not match the computed one.
    #[error("check digit mismatch: expected {expected}, found {found}")]
    CheckDigitMismatch {
        /// Check character computed from the body.
        expected: char,
        /// Check character the caller supplied.
        found: char,
    },
}

const fn is_significant(c: char) -> bool {
    c.is_ascii_digit() || c == 'k' || c == 'K'
}

/// Strips every character that is not a digit or the check letter and
/// lowercases the result.
///
/// Never fails: empty or garbage input yields an empty string.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| is_significant(*c))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Computes the Module-11 check character for a digit body.
///
/// Returns `None` when `body` is empty or contains anything but ASCII digits.
#[must_use]
pub fn check_digit(body: &str) -> Option<char> {
    if body.is_empty() {
        return None;
    }

    let mut sum = 0_u32;
    let mut weight = FIRST_WEIGHT;
    for c in body.chars().rev() {
        let digit = c.to_digit(10)?;
        sum = (sum + digit * weight) % 11;
        weight = if weight == LAST_WEIGHT {
            FIRST_WEIGHT
        } else {
            weight + 1
        };
    }

    match sum % 11 {
        0 => Some('0'),
        1 => Some(CHECK_LETTER),
        remainder => char::from_digit(11 - remainder, 10),
    }
}

/// Splits a normalized identifier into body and check character.
fn split(normalized: &str) -> Option<(&str, char)> {
    let check = normalized.chars().last()?;
    let body = &normalized[..normalized.len() - check.len_utf8()];
    Some((body, check))
}

/// Returns `true` when `raw` carries a correct Module-11 check character.
///
/// Formatting is irrelevant: `12.345.678-5` and `123456785` validate alike.
#[must_use]
pub fn validate(raw: &str) -> bool {
    Rut::parse(raw).is_ok()
}

/// Renders an identifier for display: `12.345.678-5`.
///
/// Input with fewer than two significant characters is returned unchanged so
/// partially typed input can be echoed back as-is. This is not a validity
/// claim.
#[must_use]
pub fn format(raw: &str) -> String {
    let significant: String = raw.chars().filter(|c| is_significant(*c)).collect();
    if significant.chars().count() < 2 {
        return raw.to_string();
    }

    match split(&significant) {
        Some((body, check)) => {
            format!("{}-{}", group_thousands(body), check.to_ascii_uppercase())
        }
        None => raw.to_string(),
    }
}

/// Inserts `.` every three digits from the right. Non-numeric bodies are left alone.
fn group_thousands(body: &str) -> String {
    if !body.chars().all(|c| c.is_ascii_digit()) {
        return body.to_string();
    }

    let len = body.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in body.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

/// A validated identifier in canonical form (digits plus lowercase check character).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rut(String);

impl Rut {
    /// Parses and validates a raw identifier in any formatting.
    ///
    /// # Errors
    ///
    /// - [`RutError::TooShort`] when fewer than two significant characters remain
    /// - [`RutError::MalformedBody`] when the body is not all digits
    /// - [`RutError::CheckDigitMismatch`] when the check character is wrong
    pub fn parse(raw: &str) -> Result<Self, RutError> {
        let normalized = normalize(raw);
        if normalized.len() < 2 {
            return Err(RutError::TooShort(raw.to_string()));
        }

        let Some((body, found)) = split(&normalized) else {
            return Err(RutError::TooShort(raw.to_string()));
        };
        let Some(expected) = check_digit(body) else {
            return Err(RutError::MalformedBody(raw.to_string()));
        };
        if expected != found {
            return Err(RutError::CheckDigitMismatch { expected, found });
        }

        Ok(Self(normalized))
    }

    /// The canonical form, e.g. `123456785`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digits before the check character.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.0[..self.0.len() - 1]
    }

    /// The lowercase check character.
    #[must_use]
    pub fn check_char(&self) -> char {
        // Parsed values always hold at least two ASCII characters.
        self.0.chars().last().unwrap_or('0')
    }

    /// Consumes the value, returning the canonical string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Rut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format(&self.0))
    }
}

impl AsRef<str> for Rut {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Rut {
    type Error = RutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Rut> for String {
    fn from(value: Rut) -> Self {
        value.0
    }
}

impl std::str::FromStr for Rut {
    type Err = RutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
