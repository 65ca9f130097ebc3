//! Concurrency-safe memoization of numerology profiles.
//!
//! Profiles are pure functions of (name, birth date), so entries are never
//! invalidated for the life of the process.

use chrono::NaiveDate;
use dashmap::DashMap;
use tracing::trace;

use crate::types::{IdentityInput, InvalidInputError, NumerologyProfile};

/// Cache key: ASCII case-folded, trimmed name plus birth date.
///
/// Only ASCII letters carry values, so folding is limited to ASCII. Full
/// Unicode folding would merge names like `\u{212A}ate` (Kelvin sign) with
/// `kate` even though their values differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ProfileKey {
    name: String,
    birth_date: NaiveDate,
}

impl ProfileKey {
    fn from_identity(identity: &IdentityInput) -> Self {
        Self {
            name: identity.full_name.trim().to_ascii_lowercase(),
            birth_date: identity.birth_date,
        }
    }
}

/// Lock-sharded profile cache shared by any number of callers.
#[derive(Debug, Default)]
pub struct ProfileCache {
    entries: DashMap<ProfileKey, NumerologyProfile>,
}

impl ProfileCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up a cached profile.
    pub fn get(&self, identity: &IdentityInput) -> Option<NumerologyProfile> {
        self.entries
            .get(&ProfileKey::from_identity(identity))
            .map(|entry| *entry.value())
    }

    /// Return the cached profile or compute and store it.
    ///
    /// Errors are returned to the caller and never cached.
    pub fn get_or_try_insert(
        &self,
        identity: &IdentityInput,
        compute: impl FnOnce() -> Result<NumerologyProfile, InvalidInputError>,
    ) -> Result<NumerologyProfile, InvalidInputError> {
        let key = ProfileKey::from_identity(identity);
        if let Some(hit) = self.entries.get(&key) {
            trace!(birth_date = %key.birth_date, "Profile cache hit");
            return Ok(*hit.value());
        }

        let profile = compute()?;
        self.entries.insert(key, profile);
        Ok(profile)
    }

    /// Number of cached profiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
