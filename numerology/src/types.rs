//! Core types for numerology calculations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error types for malformed identity data.
///
/// Always recoverable by the caller, typically by falling back to
/// unpersonalized content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    /// Name is empty after trimming
    #[error("Full name is empty")]
    EmptyName,

    /// Name has no vowels, so no soul urge can be derived
    #[error("Full name contains no vowels: {0:?}")]
    NoVowels(String),

    /// Name has no consonants, so no personality number can be derived
    #[error("Full name contains no consonants: {0:?}")]
    NoConsonants(String),

    /// Name has no mappable letters
    #[error("Full name contains no letters: {0:?}")]
    NoLetters(String),

    /// Calendar components do not form a real date
    #[error("Invalid calendar date: {year:04}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// Year cannot be written as four calendar digits
    #[error("Year out of range (1-9999): {0}")]
    YearOutOfRange(i32),

    /// Focus numbers are chosen from 1-9
    #[error("Focus number out of range (1-9): {0}")]
    FocusOutOfRange(u32),
}

/// Identity data a profile is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityInput {
    /// Full name as entered by the user
    pub full_name: String,
    /// Birth date, calendar-component semantics (no timezone)
    pub birth_date: NaiveDate,
}

impl IdentityInput {
    /// Create an identity from an already-valid date.
    pub fn new(full_name: impl Into<String>, birth_date: NaiveDate) -> Self {
        Self {
            full_name: full_name.into(),
            birth_date,
        }
    }

    /// Create an identity from raw calendar components.
    pub fn from_parts(
        full_name: impl Into<String>,
        year: i32,
        month: u32,
        day: u32,
    ) -> Result<Self, InvalidInputError> {
        let birth_date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or(InvalidInputError::InvalidDate { year, month, day })?;
        Ok(Self::new(full_name, birth_date))
    }
}

/// Canonical numerology values for one identity.
///
/// Immutable; every value is in `[1, 9]` or a master number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NumerologyProfile {
    /// From all digits of the birth date
    pub life_path_number: u32,
    /// From the vowels of the full name
    pub soul_urge_number: u32,
    /// From every letter of the full name
    pub expression_number: u32,
    /// From the consonants of the full name, absent for all-vowel names
    pub personality_number: Option<u32>,
    /// From the day of month
    pub birthday_number: u32,
}
