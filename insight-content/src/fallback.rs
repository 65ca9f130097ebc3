//! Hand-authored minimal fallback insights.
//!
//! The last step of the selection chain. A correctly deployed corpus has a
//! fallback that fits every enabled surface; [`Corpus::check_coverage`]
//! verifies this at startup.
//!
//! [`Corpus::check_coverage`]: crate::corpus::Corpus::check_coverage

use crate::types::{ContentEntry, SourceTier};

/// Id prefix reserved for fallback entries. Corpus records may not use it.
pub const FALLBACK_ID_PREFIX: &str = "fallback-";

/// Supplies fallback entries for a corpus.
pub trait FallbackProvider: Send + Sync {
    /// Name used in load reports
    fn name(&self) -> &str;

    /// Fallback entries. Ids must start with [`FALLBACK_ID_PREFIX`].
    fn fallbacks(&self) -> Vec<ContentEntry>;
}

/// Built-in fallbacks, one per size class of the default surface table.
pub struct BuiltinFallbacks;

impl FallbackProvider for BuiltinFallbacks {
    fn name(&self) -> &str {
        "builtin"
    }

    fn fallbacks(&self) -> Vec<ContentEntry> {
        vec![
            ContentEntry::new("fallback-inline", SourceTier::Curated, None, "Breathe in."),
            ContentEntry::new(
                "fallback-rectangular",
                SourceTier::Curated,
                None,
                "Trust your path.",
            ),
            ContentEntry::new(
                "fallback-medium",
                SourceTier::Curated,
                None,
                "Pause, breathe, and trust your path.",
            ),
            ContentEntry::new(
                "fallback-large",
                SourceTier::Curated,
                None,
                "Every moment carries a quiet invitation. Pause, breathe, and trust the path unfolding before you.",
            ),
        ]
    }
}

/// Fallbacks supplied directly, e.g. from a host-app bundle.
pub struct StaticFallbacks {
    name: String,
    entries: Vec<ContentEntry>,
}

impl StaticFallbacks {
    pub fn new(name: impl Into<String>, entries: Vec<ContentEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// No fallbacks at all. Only useful for exercising misconfiguration.
    pub fn none() -> Self {
        Self::new("none", Vec::new())
    }
}

impl FallbackProvider for StaticFallbacks {
    fn name(&self) -> &str {
        &self.name
    }

    fn fallbacks(&self) -> Vec<ContentEntry> {
        self.entries.clone()
    }
}
