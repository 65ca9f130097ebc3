//! NumerologyEngine - derives canonical numbers from identity data.
//!
//! Conventions held across the workspace:
//!
//! - Life path sums all eight digits of the zero-padded `YYYYMMDD` date.
//! - Name numbers sum letter values over the whole name, then reduce once
//!   through the shared primitive.
//! - `Y` is always a consonant; letters outside A-Z are skipped.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::cache::ProfileCache;
use crate::letters::{values_where, LetterClass};
use crate::reduce::{digit_sum, reduce_to_single_digit_or_master};
use crate::types::{IdentityInput, InvalidInputError, NumerologyProfile};

/// Pure numerology calculator with an optional memoizing cache.
#[derive(Debug, Clone, Default)]
pub struct NumerologyEngine {
    cache: Option<Arc<ProfileCache>>,
}

impl NumerologyEngine {
    /// Create an engine without caching.
    pub fn new() -> Self {
        Self { cache: None }
    }

    /// Create an engine that memoizes profiles in a fresh cache.
    pub fn with_cache() -> Self {
        Self {
            cache: Some(Arc::new(ProfileCache::new())),
        }
    }

    /// Create an engine sharing an existing cache.
    pub fn with_shared_cache(cache: Arc<ProfileCache>) -> Self {
        Self { cache: Some(cache) }
    }

    /// The cache backing this engine, if any.
    pub fn cache(&self) -> Option<&Arc<ProfileCache>> {
        self.cache.as_ref()
    }

    /// Life path number from the eight digits of `YYYYMMDD`.
    ///
    /// 1990-11-02: 1+9+9+0+1+1+0+2 = 23 -> 5.
    pub fn compute_life_path(&self, birth_date: NaiveDate) -> Result<u32, InvalidInputError> {
        let year = calendar_year(birth_date.year())?;
        let total = digit_sum(year) + digit_sum(u64::from(birth_date.month())) + digit_sum(u64::from(birth_date.day()));
        Ok(reduce_to_single_digit_or_master(total))
    }

    /// Soul urge number from the vowels of the full name.
    pub fn compute_soul_urge(&self, full_name: &str) -> Result<u32, InvalidInputError> {
        let name = non_empty_name(full_name)?;
        sum_letters(name, |class| class == LetterClass::Vowel)
            .map(reduce_to_single_digit_or_master)
            .ok_or_else(|| InvalidInputError::NoVowels(name.to_string()))
    }

    /// Expression number from every letter of the full name.
    pub fn compute_expression(&self, full_name: &str) -> Result<u32, InvalidInputError> {
        let name = non_empty_name(full_name)?;
        sum_letters(name, |_| true)
            .map(reduce_to_single_digit_or_master)
            .ok_or_else(|| InvalidInputError::NoLetters(name.to_string()))
    }

    /// Personality number from the consonants of the full name.
    pub fn compute_personality(&self, full_name: &str) -> Result<u32, InvalidInputError> {
        let name = non_empty_name(full_name)?;
        sum_letters(name, |class| class == LetterClass::Consonant)
            .map(reduce_to_single_digit_or_master)
            .ok_or_else(|| InvalidInputError::NoConsonants(name.to_string()))
    }

    /// Birthday number from the day of month (the 29th gives 11).
    pub fn compute_birthday(&self, birth_date: NaiveDate) -> u32 {
        reduce_to_single_digit_or_master(u64::from(birth_date.day()))
    }

    /// Personal year number for `year`: birth month and day digits plus the year's digits.
    pub fn compute_personal_year(&self, birth_date: NaiveDate, year: i32) -> Result<u32, InvalidInputError> {
        let year = calendar_year(year)?;
        let total = digit_sum(u64::from(birth_date.month())) + digit_sum(u64::from(birth_date.day())) + digit_sum(year);
        Ok(reduce_to_single_digit_or_master(total))
    }

    /// Validate a user-chosen focus number.
    pub fn validate_focus_number(&self, focus: u32) -> Result<u32, InvalidInputError> {
        if (1..=9).contains(&focus) {
            Ok(focus)
        } else {
            Err(InvalidInputError::FocusOutOfRange(focus))
        }
    }

    /// Compute the full profile, consulting the cache when enabled.
    pub fn compute_profile(&self, identity: &IdentityInput) -> Result<NumerologyProfile, InvalidInputError> {
        match &self.cache {
            Some(cache) => cache.get_or_try_insert(identity, || self.compute_profile_uncached(identity)),
            None => self.compute_profile_uncached(identity),
        }
    }

    fn compute_profile_uncached(&self, identity: &IdentityInput) -> Result<NumerologyProfile, InvalidInputError> {
        let personality_number = match self.compute_personality(&identity.full_name) {
            Ok(n) => Some(n),
            Err(InvalidInputError::NoConsonants(_)) => None,
            Err(e) => return Err(e),
        };

        Ok(NumerologyProfile {
            life_path_number: self.compute_life_path(identity.birth_date)?,
            soul_urge_number: self.compute_soul_urge(&identity.full_name)?,
            expression_number: self.compute_expression(&identity.full_name)?,
            personality_number,
            birthday_number: self.compute_birthday(identity.birth_date),
        })
    }
}

fn non_empty_name(full_name: &str) -> Result<&str, InvalidInputError> {
    let trimmed = full_name.trim();
    if trimmed.is_empty() {
        Err(InvalidInputError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

fn calendar_year(year: i32) -> Result<u64, InvalidInputError> {
    if (1..=9999).contains(&year) {
        Ok(year as u64)
    } else {
        Err(InvalidInputError::YearOutOfRange(year))
    }
}

/// Sum of matching letter values, `None` if no letter matched.
fn sum_letters(name: &str, filter: impl Fn(LetterClass) -> bool) -> Option<u64> {
    values_where(name, filter).fold(None, |acc, v| Some(acc.unwrap_or(0) + u64::from(v)))
}
