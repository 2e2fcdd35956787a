//! ISO 4217 currency code type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CurrencyCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyCodeError {
    /// The input string is empty.
    #[error("currency code cannot be empty")]
    Empty,
    /// The input is not exactly three characters long.
    #[error("currency code must be exactly 3 letters (got {0})")]
    WrongLength(usize),
    /// The input contains something other than ASCII letters.
    #[error("currency code must contain only ASCII letters")]
    InvalidCharacter,
}

/// An ISO 4217 alphabetic currency code (e.g. `USD`, `EUR`, `PLN`).
///
/// Parsing trims surrounding whitespace and normalises to upper case, so
/// `" eur"` and `"EUR"` produce the same code. Membership in a shop's list of
/// supported currencies is checked elsewhere; this type only guarantees the
/// shape.
///
/// ## Examples
///
/// ```
/// use harbor_core::CurrencyCode;
///
/// assert_eq!(CurrencyCode::parse("pln").unwrap().as_str(), "PLN");
/// assert!(CurrencyCode::parse("").is_err());
/// assert!(CurrencyCode::parse("EURO").is_err());
/// assert!(CurrencyCode::parse("U$D").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse a `CurrencyCode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, is not three
    /// characters long, or contains non-ASCII-letter characters.
    pub fn parse(s: &str) -> Result<Self, CurrencyCodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CurrencyCodeError::Empty);
        }

        let len = trimmed.chars().count();
        if len != 3 {
            return Err(CurrencyCodeError::WrongLength(len));
        }

        if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CurrencyCodeError::InvalidCharacter);
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display symbol and whether it is written after the amount.
    ///
    /// Unknown codes fall back to the code itself, written as a suffix.
    #[must_use]
    pub fn symbol(&self) -> (&str, bool) {
        match self.0.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" => ("$", false),
            "EUR" => ("€", false),
            "GBP" => ("£", false),
            "JPY" => ("¥", false),
            "PLN" => ("zł", true),
            "CZK" => ("Kč", true),
            "SEK" | "NOK" | "DKK" => ("kr", true),
            "CHF" => ("CHF", true),
            other => (other, true),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = CurrencyCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
