//! ContentSelector - deterministic, budget-aware insight selection.
//!
//! Selection walks a fixed fallback chain. Within every stage, tiers are
//! tried in precedence order (curated, template, generated) and the first
//! tier with at least one candidate that fits the budget wins:
//!
//! 1. **Tagged**: number matches and every entry tag is in the request
//! 2. **Numbered**: number matches, tag requirements dropped
//! 3. **Generic**: no associated number; tag-satisfied entries first
//! 4. **Fallback**: longest hand-authored fallback that fits
//!
//! Among equal candidates the pick is `SHA-256(rotation window, budget,
//! number, stage) mod count` over candidates sorted by id, so a request is
//! stable within its rotation window and rotates across windows. Tags only
//! filter candidates; a tag no entry targets never moves the pick.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::corpus::Corpus;
use crate::surface::SurfaceBudget;
use crate::truncate::{truncate_at_word_boundary, DEFAULT_MARKER};
use crate::types::{display_length, ContentEntry, SelectionKeys, SelectionResult, SelectionStage, SourceTier};

/// Error types for selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Surface cannot render text; the caller should render nothing
    #[error("Surface cannot render text")]
    SurfaceUnsupported,

    /// No entry or fallback fits; the corpus is misconfigured
    #[error("No content or fallback fits a {min}-{max} character budget")]
    NoFallbackAvailable { min: usize, max: usize },
}

/// Selector behavior knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Permit word-boundary truncation when nothing fits
    pub allow_truncation: bool,
    /// Continuation marker appended to truncated text
    pub truncation_marker: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            allow_truncation: false,
            truncation_marker: DEFAULT_MARKER.to_string(),
        }
    }
}

/// Selects insights from a shared, immutable corpus.
#[derive(Debug, Clone)]
pub struct ContentSelector {
    corpus: Arc<Corpus>,
    config: SelectorConfig,
}

impl ContentSelector {
    /// Create a selector over a published corpus.
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self {
            corpus,
            config: SelectorConfig::default(),
        }
    }

    /// Builder: set configuration.
    pub fn with_config(mut self, config: SelectorConfig) -> Self {
        self.config = config;
        self
    }

    /// The corpus this selector reads.
    pub fn corpus(&self) -> &Arc<Corpus> {
        &self.corpus
    }

    /// Select one insight for `keys` that fits `budget`.
    pub fn select(&self, keys: &SelectionKeys, budget: SurfaceBudget) -> Result<SelectionResult, SelectionError> {
        if budget.is_disabled() {
            return Err(SelectionError::SurfaceUnsupported);
        }

        let entries = self.corpus.entries();

        if let Some(number) = keys.primary_number {
            let numbered = |e: &&ContentEntry| e.associated_number() == Some(number);

            let tagged = entries
                .iter()
                .filter(numbered)
                .filter(|e| !e.tags().is_empty() && e.tags_satisfied_by(&keys.tags));
            if let Some(result) = self.pick(tagged, keys, budget, SelectionStage::Tagged) {
                return Ok(result);
            }

            let any_tags = entries.iter().filter(numbered);
            if let Some(result) = self.pick(any_tags, keys, budget, SelectionStage::Numbered) {
                return Ok(result);
            }
        }

        let satisfied = entries
            .iter()
            .filter(|e| e.is_generic() && e.tags_satisfied_by(&keys.tags));
        if let Some(result) = self.pick(satisfied, keys, budget, SelectionStage::Generic) {
            return Ok(result);
        }

        let generic = entries.iter().filter(|e| e.is_generic());
        if let Some(result) = self.pick(generic, keys, budget, SelectionStage::Generic) {
            return Ok(result);
        }

        if let Some(result) = self.pick_fallback(budget) {
            return Ok(result);
        }

        if self.config.allow_truncation {
            if let Some(result) = self.truncate_closest(keys, budget) {
                return Ok(result);
            }
        }

        Err(SelectionError::NoFallbackAvailable {
            min: budget.min,
            max: budget.max,
        })
    }

    /// Pick from the highest-precedence tier with fitting candidates.
    fn pick<'a>(
        &self,
        candidates: impl Iterator<Item = &'a ContentEntry> + Clone,
        keys: &SelectionKeys,
        budget: SurfaceBudget,
        stage: SelectionStage,
    ) -> Option<SelectionResult> {
        for tier in SourceTier::all_by_precedence() {
            // Corpus entries are already sorted by id
            let fitting: Vec<&ContentEntry> = candidates
                .clone()
                .filter(|e| e.source_tier() == tier && budget.fits(e.length()))
                .collect();

            if fitting.is_empty() {
                continue;
            }

            let index = rotation_index(keys, budget, stage, fitting.len());
            let entry = fitting[index];
            debug!(
                entry_id = %entry.id(),
                stage = ?stage,
                tier = %tier.as_str(),
                candidates = fitting.len(),
                "Selected insight"
            );

            let used_numerology_value = match stage {
                SelectionStage::Tagged | SelectionStage::Numbered => entry.associated_number(),
                _ => None,
            };

            return Some(SelectionResult {
                text: entry.text().to_string(),
                source_entry_id: entry.id().to_string(),
                used_numerology_value,
                truncated: false,
                stage,
                source_tier: Some(tier),
            });
        }
        None
    }

    /// Longest fallback that fits; ties broken by id.
    fn pick_fallback(&self, budget: SurfaceBudget) -> Option<SelectionResult> {
        let fallback = self
            .corpus
            .fallbacks()
            .iter()
            .filter(|f| budget.fits(f.length()))
            .max_by(|a, b| a.length().cmp(&b.length()).then_with(|| b.id().cmp(a.id())))?;

        debug!(entry_id = %fallback.id(), "Selected fallback insight");
        Some(SelectionResult {
            text: fallback.text().to_string(),
            source_entry_id: fallback.id().to_string(),
            used_numerology_value: None,
            truncated: false,
            stage: SelectionStage::Fallback,
            source_tier: None,
        })
    }

    /// Truncate the shortest over-budget entry for this number (else generic).
    fn truncate_closest(&self, keys: &SelectionKeys, budget: SurfaceBudget) -> Option<SelectionResult> {
        let entries = self.corpus.entries();
        let numbered = keys.primary_number.and_then(|n| {
            shortest_over(entries.iter().filter(|e| e.associated_number() == Some(n)), budget.max)
        });
        let entry = numbered.or_else(|| shortest_over(entries.iter().filter(|e| e.is_generic()), budget.max))?;

        let text = truncate_at_word_boundary(entry.text(), budget.max, &self.config.truncation_marker)?;
        if !budget.fits(display_length(&text)) {
            return None;
        }

        debug!(entry_id = %entry.id(), "Truncated insight to fit budget");
        Some(SelectionResult {
            text,
            source_entry_id: entry.id().to_string(),
            used_numerology_value: entry.associated_number(),
            truncated: true,
            stage: SelectionStage::Truncated,
            source_tier: Some(entry.source_tier()),
        })
    }
}

fn shortest_over<'a>(pool: impl Iterator<Item = &'a ContentEntry>, max: usize) -> Option<&'a ContentEntry> {
    pool.filter(|e| e.length() > max)
        .min_by(|a, b| a.length().cmp(&b.length()).then_with(|| a.id().cmp(b.id())))
}

/// Deterministic candidate index for a request.
fn rotation_index(keys: &SelectionKeys, budget: SurfaceBudget, stage: SelectionStage, count: usize) -> usize {
    let mut hasher = Sha256::new();
    hasher.update(keys.rotation_key.as_bytes());
    hasher.update(format!("|{}|{}|", budget.min, budget.max).as_bytes());
    match keys.primary_number {
        Some(n) => hasher.update(n.to_string().as_bytes()),
        None => hasher.update(b"-"),
    }
    hasher.update(format!("|{stage:?}").as_bytes());

    let digest = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % count as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CorpusLoader;
    use crate::fallback::StaticFallbacks;
    use crate::surface::{SurfaceId, SurfaceTable};
    use proptest::prelude::*;

    const LARGE: SurfaceBudget = SurfaceId::Large.default_budget();
    const MEDIUM: SurfaceBudget = SurfaceId::Medium.default_budget();
    const RECT: SurfaceBudget = SurfaceId::Rectangular.default_budget();

    fn entry(id: &str, tier: SourceTier, number: Option<u32>, text: &str) -> ContentEntry {
        ContentEntry::new(id, tier, number, text)
    }

    fn selector(entries: Vec<ContentEntry>) -> ContentSelector {
        let (corpus, _) = CorpusLoader::new(SurfaceTable::default())
            .from_entries(entries)
            .unwrap();
        ContentSelector::new(Arc::new(corpus))
    }

    fn lp7_corpus() -> Vec<ContentEntry> {
        vec![
            entry(
                "lp7-tagged-morning",
                SourceTier::Curated,
                Some(7),
                "Morning light favors study. Read one page that stretches your understanding today.",
            )
            .with_tags(["morning"]),
            entry(
                "lp7-numbered",
                SourceTier::Curated,
                Some(7),
                "Your path rewards patient inquiry. Trust the questions that keep returning to you.",
            ),
            entry(
                "lp7-numbered-generated",
                SourceTier::Generated,
                Some(7),
                "The seeker in you is awake. Follow the thread of curiosity wherever it leads you today.",
            ),
            entry(
                "generic-large",
                SourceTier::Template,
                None,
                "Each day offers a fresh chance to listen inward and act with quiet intention.",
            ),
            entry("lp3-medium", SourceTier::Curated, Some(3), "Create something joyful today."),
        ]
    }

    #[test]
    fn test_disabled_surface_unsupported() {
        let selector = selector(lp7_corpus());
        let keys = SelectionKeys::new("2026-10-18").with_primary(7);
        assert_eq!(
            selector.select(&keys, SurfaceBudget::DISABLED),
            Err(SelectionError::SurfaceUnsupported)
        );
    }

    #[test]
    fn test_tagged_stage_first() {
        let selector = selector(lp7_corpus());
        let keys = SelectionKeys::new("2026-10-18").with_primary(7).with_tag("morning");

        let result = selector.select(&keys, LARGE).unwrap();
        assert_eq!(result.source_entry_id, "lp7-tagged-morning");
        assert_eq!(result.stage, SelectionStage::Tagged);
        assert_eq!(result.used_numerology_value, Some(7));
        assert!(!result.truncated);
    }

    #[test]
    fn test_drops_tags_then_prefers_curated() {
        let selector = selector(lp7_corpus());
        let keys = SelectionKeys::new("2026-10-18").with_primary(7).with_tag("evening");

        let result = selector.select(&keys, LARGE).unwrap();
        // Tagged entry does not match "evening"; curated outranks generated
        assert_eq!(result.stage, SelectionStage::Numbered);
        assert_eq!(result.source_tier, Some(SourceTier::Curated));
        assert!(result.source_entry_id.starts_with("lp7-"));
        assert_ne!(result.source_entry_id, "lp7-numbered-generated");
    }

    #[test]
    fn test_generic_when_number_missing() {
        let selector = selector(lp7_corpus());
        let keys = SelectionKeys::new("2026-10-18").with_primary(9);

        let result = selector.select(&keys, LARGE).unwrap();
        assert_eq!(result.source_entry_id, "generic-large");
        assert_eq!(result.stage, SelectionStage::Generic);
        assert_eq!(result.used_numerology_value, None);
    }

    #[test]
    fn test_unpersonalized_keys_skip_numbered_stages() {
        let selector = selector(lp7_corpus());
        let keys = SelectionKeys::new("2026-10-18").with_tag("morning");

        let result = selector.select(&keys, LARGE).unwrap();
        assert_eq!(result.source_entry_id, "generic-large");
    }

    #[test]
    fn test_generic_skips_unsatisfied_tags() {
        let selector = selector(vec![
            entry("generic-a-night", SourceTier::Curated, None, "Rest now; the stars keep watch.")
                .with_tags(["night"]),
            entry("generic-b-plain", SourceTier::Curated, None, "Small steps still move you."),
        ]);

        for day in 1..=28 {
            let keys = SelectionKeys::new(format!("2026-04-{day:02}")).with_tag("morning");
            assert_eq!(selector.select(&keys, MEDIUM).unwrap().source_entry_id, "generic-b-plain");
        }
    }

    #[test]
    fn test_generic_relaxes_tags_as_last_generic_pass() {
        let selector = selector(vec![entry(
            "generic-night",
            SourceTier::Curated,
            None,
            "Rest now; the stars keep watch.",
        )
        .with_tags(["night"])]);

        let keys = SelectionKeys::new("2026-10-18").with_tag("morning");
        let result = selector.select(&keys, MEDIUM).unwrap();
        assert_eq!(result.source_entry_id, "generic-night");
        assert_eq!(result.stage, SelectionStage::Generic);
    }

    #[test]
    fn test_fallback_when_nothing_fits() {
        let selector = selector(lp7_corpus());
        let keys = SelectionKeys::new("2026-10-18").with_primary(7);

        // No corpus entry is short enough for the rectangular surface
        let result = selector.select(&keys, RECT).unwrap();
        assert_eq!(result.source_entry_id, "fallback-rectangular");
        assert_eq!(result.stage, SelectionStage::Fallback);
        assert_eq!(result.source_tier, None);
        assert!(RECT.fits(display_length(&result.text)));
    }

    #[test]
    fn test_no_fallback_available() {
        let (corpus, _) = CorpusLoader::new(SurfaceTable::default())
            .with_fallbacks(StaticFallbacks::none())
            .without_coverage_check()
            .from_entries(lp7_corpus())
            .unwrap();
        let selector = ContentSelector::new(Arc::new(corpus));
        let keys = SelectionKeys::new("2026-10-18").with_primary(7);

        assert_eq!(
            selector.select(&keys, RECT),
            Err(SelectionError::NoFallbackAvailable { min: 8, max: 20 })
        );
    }

    #[test]
    fn test_truncation_only_when_enabled() {
        let (corpus, _) = CorpusLoader::new(SurfaceTable::default())
            .with_fallbacks(StaticFallbacks::none())
            .without_coverage_check()
            .from_entries(lp7_corpus())
            .unwrap();
        let selector = ContentSelector::new(Arc::new(corpus)).with_config(SelectorConfig {
            allow_truncation: true,
            ..Default::default()
        });
        let keys = SelectionKeys::new("2026-10-18").with_primary(3);

        let result = selector.select(&keys, RECT).unwrap();
        assert!(result.truncated);
        assert_eq!(result.stage, SelectionStage::Truncated);
        assert_eq!(result.source_entry_id, "lp3-medium");
        assert_eq!(result.text, "Create something…");
        assert!(RECT.fits(display_length(&result.text)));
    }

    #[test]
    fn test_deterministic_within_window_and_rotates_across() {
        let entries: Vec<ContentEntry> = (0..12)
            .map(|i| {
                entry(
                    &format!("lp5-{i:02}"),
                    SourceTier::Curated,
                    Some(5),
                    &format!("Change is your guide today, and this is lesson {i}."),
                )
            })
            .collect();
        let selector = selector(entries);

        let keys = SelectionKeys::new("2026-10-18").with_primary(5);
        let first = selector.select(&keys, LARGE).unwrap();
        let again = selector.select(&keys, LARGE).unwrap();
        assert_eq!(first.source_entry_id, again.source_entry_id);

        let picks: std::collections::HashSet<String> = (1..=28)
            .map(|day| {
                let keys = SelectionKeys::new(format!("2026-02-{day:02}")).with_primary(5);
                selector.select(&keys, LARGE).unwrap().source_entry_id
            })
            .collect();
        assert!(picks.len() > 1, "selection never rotated across days");
    }

    #[test]
    fn test_untargeted_tags_do_not_move_pick() {
        let entries: Vec<ContentEntry> = (0..12)
            .map(|i| {
                entry(
                    &format!("lp3-{i:02}"),
                    SourceTier::Curated,
                    Some(3),
                    &format!("Say it with color {i}."),
                )
            })
            .collect();
        let selector = selector(entries);

        for day in 1..=28 {
            let window = format!("2026-03-{day:02}");
            let plain = SelectionKeys::new(window.clone()).with_primary(3);
            let expected = selector.select(&plain, MEDIUM).unwrap().source_entry_id;

            for extra in [["morning", "calm"], ["night", "elevated"], ["evening", "active"]] {
                let keys = plain.clone().with_tags(extra);
                assert_eq!(selector.select(&keys, MEDIUM).unwrap().source_entry_id, expected);
            }
        }
    }

    #[test]
    fn test_builtin_corpus_serves_every_number_and_surface() {
        let selector = ContentSelector::new(Arc::new(Corpus::builtin().unwrap()));
        for n in [1, 2, 3, 4, 5, 6, 7, 8, 9, 11, 22, 33, 44] {
            for (surface, budget) in SurfaceTable::default().enabled() {
                let keys = SelectionKeys::new("2026-10-18").with_primary(n);
                let result = selector.select(&keys, budget).unwrap();
                assert!(
                    budget.fits(display_length(&result.text)),
                    "{surface} result for {n} out of budget: {:?}",
                    result.text
                );
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_selection_shares_corpus() {
        let selector = Arc::new(ContentSelector::new(Arc::new(Corpus::builtin().unwrap())));
        let keys = SelectionKeys::new("2026-10-18").with_primary(7);
        let expected = selector.select(&keys, MEDIUM).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let selector = Arc::clone(&selector);
                let keys = keys.clone();
                tokio::spawn(async move { selector.select(&keys, MEDIUM) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), expected);
        }
    }

    proptest! {
        #[test]
        fn proptest_results_within_budget(
            number in prop::sample::select(vec![1u32, 2, 3, 4, 5, 6, 7, 8, 9, 11, 22, 33, 44]),
            day in 1u32..=28,
            tag in prop::sample::select(vec!["morning", "evening", "night", "retrograde", "full_moon"]),
            surface in prop::sample::select(SurfaceId::all().to_vec()),
        ) {
            let selector = ContentSelector::new(Arc::new(Corpus::builtin().unwrap()));
            let budget = surface.default_budget();
            let keys = SelectionKeys::new(format!("2026-03-{day:02}")).with_primary(number).with_tag(tag);

            match selector.select(&keys, budget) {
                Ok(result) => {
                    prop_assert!(budget.fits(display_length(&result.text)));
                    prop_assert!(!result.truncated);
                }
                Err(err) => {
                    prop_assert!(budget.is_disabled());
                    prop_assert_eq!(err, SelectionError::SurfaceUnsupported);
                }
            }
        }

        #[test]
        fn proptest_same_keys_same_entry(day in 1u32..=28, number in 1u32..=9) {
            let selector = ContentSelector::new(Arc::new(Corpus::builtin().unwrap()));
            let keys = SelectionKeys::new(format!("2026-05-{day:02}")).with_primary(number);
            let a = selector.select(&keys, LARGE).unwrap();
            let b = selector.select(&keys, LARGE).unwrap();
            prop_assert_eq!(a.source_entry_id, b.source_entry_id);
        }
    }
}
