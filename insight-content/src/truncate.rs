//! Last-resort word-boundary truncation.
//!
//! Production corpora are pre-validated so this never runs; it is only
//! reachable when the selector is explicitly configured to allow it.

use unicode_segmentation::UnicodeSegmentation;

use crate::types::display_length;

/// Default continuation marker.
pub const DEFAULT_MARKER: &str = "…";

/// Cut `text` at a word boundary so that it plus `marker` fits in `max`
/// characters.
///
/// Returns the text unchanged if it already fits, and `None` if not even
/// the first word fits. Trailing whitespace and punctuation before the
/// marker are dropped.
pub fn truncate_at_word_boundary(text: &str, max: usize, marker: &str) -> Option<String> {
    if display_length(text) <= max {
        return Some(text.to_string());
    }

    let budget = max.checked_sub(display_length(marker))?;
    let mut used = 0;
    let mut cut = None;

    for (start, segment) in text.split_word_bound_indices() {
        used += display_length(segment);
        if used > budget {
            break;
        }
        if segment.chars().any(char::is_alphanumeric) {
            cut = Some(start + segment.len());
        }
    }

    let kept = text[..cut?].trim_end_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation());
    if kept.is_empty() {
        return None;
    }
    Some(format!("{kept}{marker}"))
}
