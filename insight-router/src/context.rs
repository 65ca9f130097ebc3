//! Cosmic context consumed by the router.
//!
//! The snapshot is computed elsewhere (ephemeris, sensors) and treated as
//! an opaque bundle; this module only turns its fields into selection tags
//! and a rotation window key.

use std::collections::BTreeSet;

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Context bundle for one insight request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmicContextSnapshot {
    /// Realm number from the cosmic engine, if known
    pub realm_number: Option<u32>,
    /// Free-form context tags supplied by the host
    #[serde(default)]
    pub context_tags: BTreeSet<String>,
    /// Local wall-clock time of the request
    pub timestamp: NaiveDateTime,
    /// Latest heart-rate reading (beats per minute)
    #[serde(default)]
    pub heart_rate: Option<f64>,
    /// Location-derived scalar, passed through untouched
    #[serde(default)]
    pub location_scalar: Option<f64>,
    /// Lunar phase tag, e.g. `full_moon`
    #[serde(default)]
    pub lunar_phase: Option<String>,
    /// Planetary tags, e.g. `retrograde`
    #[serde(default)]
    pub planetary_tags: BTreeSet<String>,
}

impl CosmicContextSnapshot {
    /// Create a snapshot with only a timestamp.
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            realm_number: None,
            context_tags: BTreeSet::new(),
            timestamp,
            heart_rate: None,
            location_scalar: None,
            lunar_phase: None,
            planetary_tags: BTreeSet::new(),
        }
    }

    /// Builder: set realm number.
    pub fn with_realm(mut self, realm: u32) -> Self {
        self.realm_number = Some(realm);
        self
    }

    /// Builder: add a context tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.context_tags.insert(tag.into());
        self
    }

    /// Builder: set heart rate.
    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    /// Builder: set lunar phase.
    pub fn with_lunar_phase(mut self, phase: impl Into<String>) -> Self {
        self.lunar_phase = Some(phase.into());
        self
    }

    /// Builder: add a planetary tag.
    pub fn with_planetary_tag(mut self, tag: impl Into<String>) -> Self {
        self.planetary_tags.insert(tag.into());
        self
    }

    /// Time-of-day bucket for the snapshot's hour.
    pub fn time_of_day(&self) -> &'static str {
        match self.timestamp.hour() {
            5..=11 => "morning",
            12..=16 => "afternoon",
            17..=20 => "evening",
            _ => "night",
        }
    }

    /// Heart-rate band, if a finite reading is present.
    pub fn heart_rate_band(&self) -> Option<&'static str> {
        let bpm = self.heart_rate.filter(|bpm| bpm.is_finite())?;
        Some(if bpm < 70.0 {
            "calm"
        } else if bpm <= 100.0 {
            "active"
        } else {
            "elevated"
        })
    }

    /// All tags this snapshot contributes to a selection (lowercase).
    pub fn derived_tags(&self) -> BTreeSet<String> {
        let mut tags: BTreeSet<String> = self
            .context_tags
            .iter()
            .chain(&self.planetary_tags)
            .chain(&self.lunar_phase)
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        tags.insert(self.time_of_day().to_string());
        if let Some(band) = self.heart_rate_band() {
            tags.insert(band.to_string());
        }
        if let Some(realm) = self.realm_number {
            tags.insert(format!("realm-{realm}"));
        }
        tags
    }
}

/// How often the same request rotates to a different entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationWindow {
    Hourly,
    #[default]
    Daily,
    Weekly,
}

impl RotationWindow {
    /// Window identity for `timestamp`.
    pub fn key(&self, timestamp: NaiveDateTime) -> String {
        match self {
            Self::Hourly => timestamp.format("%Y-%m-%dT%H").to_string(),
            Self::Daily => timestamp.format("%Y-%m-%d").to_string(),
            Self::Weekly => timestamp.format("%G-W%V").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(CosmicContextSnapshot::new(at(4)).time_of_day(), "night");
        assert_eq!(CosmicContextSnapshot::new(at(5)).time_of_day(), "morning");
        assert_eq!(CosmicContextSnapshot::new(at(12)).time_of_day(), "afternoon");
        assert_eq!(CosmicContextSnapshot::new(at(20)).time_of_day(), "evening");
        assert_eq!(CosmicContextSnapshot::new(at(21)).time_of_day(), "night");
    }

    #[test]
    fn test_heart_rate_bands() {
        let snapshot = CosmicContextSnapshot::new(at(9));
        assert_eq!(snapshot.heart_rate_band(), None);
        assert_eq!(snapshot.clone().with_heart_rate(62.0).heart_rate_band(), Some("calm"));
        assert_eq!(snapshot.clone().with_heart_rate(100.0).heart_rate_band(), Some("active"));
        assert_eq!(snapshot.clone().with_heart_rate(131.5).heart_rate_band(), Some("elevated"));
        assert_eq!(snapshot.with_heart_rate(f64::NAN).heart_rate_band(), None);
    }

    #[test]
    fn test_derived_tags() {
        let snapshot = CosmicContextSnapshot::new(at(22))
            .with_realm(7)
            .with_tag(" Focus ")
            .with_lunar_phase("Full_Moon")
            .with_planetary_tag("retrograde")
            .with_heart_rate(58.0);

        let tags: Vec<String> = snapshot.derived_tags().into_iter().collect();
        assert_eq!(
            tags,
            vec!["calm", "focus", "full_moon", "night", "realm-7", "retrograde"]
        );
    }

    #[test]
    fn test_rotation_keys() {
        let ts = at(9);
        assert_eq!(RotationWindow::Daily.key(ts), "2026-10-18");
        assert_eq!(RotationWindow::Hourly.key(ts), "2026-10-18T09");
        assert_eq!(RotationWindow::Weekly.key(ts), "2026-W42");
    }

    #[test]
    fn test_weekly_key_uses_iso_year() {
        let ts = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(RotationWindow::Weekly.key(ts), "2026-W53");
    }
}
