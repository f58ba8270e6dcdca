//! Phone number value object.
//!
//! The phone number is the durable join key between customers and orders, so
//! it is normalized once at the boundary and treated as opaque afterwards.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A normalized customer phone number.
///
/// Stored form keeps an optional leading `+` followed by digits only;
/// separators (spaces, dashes, parentheses) are stripped during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    const MIN_DIGITS: usize = 7;
    const MAX_DIGITS: usize = 15;

    /// Parse and normalize a raw phone number string.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("phone number must not be empty"));
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for (i, ch) in trimmed.chars().enumerate() {
            match ch {
                '+' if i == 0 => normalized.push('+'),
                '0'..='9' => normalized.push(ch),
                ' ' | '-' | '(' | ')' | '.' => {}
                _ => {
                    return Err(DomainError::validation(format!(
                        "phone number contains invalid character '{ch}'"
                    )));
                }
            }
        }

        let digits = normalized.chars().filter(char::is_ascii_digit).count();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(DomainError::validation(format!(
                "phone number must have {} to {} digits, got {digits}",
                Self::MIN_DIGITS,
                Self::MAX_DIGITS
            )));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for PhoneNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
