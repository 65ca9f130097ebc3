//! Core types for insight content.
//!
//! Entries are immutable once a corpus is published; lengths are measured
//! in user-perceived characters (extended grapheme clusters).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Display length of `text` in user-perceived characters.
pub fn display_length(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Provenance of a content entry.
///
/// Tiers are tried in precedence order within every selection stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// Hand-written and reviewed
    Curated = 3,
    /// Produced from reviewed templates
    Template = 2,
    /// Machine-generated, lowest precedence
    Generated = 1,
}

impl SourceTier {
    /// Get the precedence value (higher = preferred)
    pub fn precedence(&self) -> u8 {
        *self as u8
    }

    /// Check if this tier is preferred over another
    pub fn outranks(&self, other: &Self) -> bool {
        self.precedence() > other.precedence()
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Curated => "curated",
            Self::Template => "template",
            Self::Generated => "generated",
        }
    }

    /// All tiers in precedence order (highest first)
    pub fn all_by_precedence() -> [Self; 3] {
        [Self::Curated, Self::Template, Self::Generated]
    }
}

/// One candidate insight.
///
/// Fields are private so the cached length can never go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentEntry {
    id: String,
    source_tier: SourceTier,
    associated_number: Option<u32>,
    tags: BTreeSet<String>,
    text: String,
    length: usize,
}

impl ContentEntry {
    /// Create an untagged entry.
    pub fn new(
        id: impl Into<String>,
        source_tier: SourceTier,
        associated_number: Option<u32>,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let length = display_length(&text);
        Self {
            id: id.into(),
            source_tier,
            associated_number,
            tags: BTreeSet::new(),
            text,
            length,
        }
    }

    /// Builder: set context tags (trimmed, lowercased, blanks dropped).
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        self
    }

    /// Replace the text, recomputing the cached length.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.length = display_length(&self.text);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn source_tier(&self) -> SourceTier {
        self.source_tier
    }

    /// Numerology value this entry speaks to; `None` for generic entries.
    pub fn associated_number(&self) -> Option<u32> {
        self.associated_number
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cached display length of the text.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Whether this entry is not tied to a number.
    pub fn is_generic(&self) -> bool {
        self.associated_number.is_none()
    }

    /// Whether every tag this entry requires is present in `context`.
    ///
    /// Untagged entries are always satisfied.
    pub fn tags_satisfied_by(&self, context: &BTreeSet<String>) -> bool {
        self.tags.is_subset(context)
    }
}

/// Keys that drive a selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionKeys {
    /// Number used to filter numbered entries (life path by default)
    pub primary_number: Option<u32>,
    /// Context tags available for this request (lowercase)
    pub tags: BTreeSet<String>,
    /// Rotation window identity, e.g. `2026-10-18` for daily rotation
    pub rotation_key: String,
}

impl SelectionKeys {
    /// Create keys for a rotation window.
    pub fn new(rotation_key: impl Into<String>) -> Self {
        Self {
            rotation_key: rotation_key.into(),
            ..Default::default()
        }
    }

    /// Builder: set primary number.
    pub fn with_primary(mut self, number: u32) -> Self {
        self.primary_number = Some(number);
        self
    }

    /// Builder: add a context tag.
    pub fn with_tag(mut self, tag: impl AsRef<str>) -> Self {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() {
            self.tags.insert(tag);
        }
        self
    }

    /// Builder: add several context tags.
    pub fn with_tags<I, S>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tags.into_iter().fold(self, |keys, tag| keys.with_tag(tag))
    }
}

/// Which step of the fallback chain produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStage {
    /// Number and context tags matched
    Tagged,
    /// Number matched, tag requirements dropped
    Numbered,
    /// Generic entry, not tied to a number
    Generic,
    /// Hand-authored minimal fallback
    Fallback,
    /// Last-resort word-boundary truncation (only when enabled)
    Truncated,
}

/// The selected insight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Text to render, within the surface budget
    pub text: String,
    /// Corpus entry the text came from
    pub source_entry_id: String,
    /// Number the entry was matched on; `None` for generic and fallback text
    pub used_numerology_value: Option<u32>,
    /// Always false unless last-resort truncation is enabled
    pub truncated: bool,
    /// Fallback-chain step that produced this result
    pub stage: SelectionStage,
    /// Tier of the source entry; `None` for fallbacks
    pub source_tier: Option<SourceTier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_precedence() {
        assert!(SourceTier::Curated.outranks(&SourceTier::Template));
        assert!(SourceTier::Template.outranks(&SourceTier::Generated));
        assert!(!SourceTier::Generated.outranks(&SourceTier::Curated));

        let tiers = SourceTier::all_by_precedence();
        assert_eq!(tiers[0], SourceTier::Curated);
        assert_eq!(tiers[2], SourceTier::Generated);
    }

    #[test]
    fn test_length_recomputed_on_set_text() {
        let mut entry = ContentEntry::new("e1", SourceTier::Curated, Some(7), "Seek.");
        assert_eq!(entry.length(), 5);

        entry.set_text("Seek the quiet truth.");
        assert_eq!(entry.length(), 21);
    }

    #[test]
    fn test_length_counts_graphemes() {
        // e + combining acute is one user-perceived character
        assert_eq!(display_length("cafe\u{301}"), 4);
        assert_eq!(display_length("🌙✨"), 2);
    }

    #[test]
    fn test_tags_normalized_and_matched() {
        let entry = ContentEntry::new("e1", SourceTier::Template, None, "Rise gently.")
            .with_tags([" Morning ", ""]);
        assert_eq!(entry.tags().len(), 1);

        let keys = SelectionKeys::new("2026-10-18").with_tags(["MORNING", "retrograde"]);
        assert!(entry.tags_satisfied_by(&keys.tags));

        let evening = SelectionKeys::new("2026-10-18").with_tag("evening");
        assert!(!entry.tags_satisfied_by(&evening.tags));
    }
}
