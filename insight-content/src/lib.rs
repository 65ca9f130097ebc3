//! Insight Content for Vybe
//!
//! Owns the insight corpus and picks one entry per request:
//!
//! - **Corpus**: validated, immutable entries loaded once at startup
//! - **Surfaces**: per-surface character budgets (`min..=max`)
//! - **Selector**: deterministic fallback chain from tagged numbered
//!   content down to hand-authored fallbacks
//!
//! Every text a selection returns fits the requested budget. Entries that
//! can never fit any surface are rejected while loading, so selection never
//! needs to truncate.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use insight_content::{Corpus, ContentSelector, SelectionKeys, SurfaceId};
//!
//! let selector = ContentSelector::new(Arc::new(Corpus::builtin()?));
//! let keys = SelectionKeys::new("2026-10-18").with_primary(7).with_tag("morning");
//! let result = selector.select(&keys, SurfaceId::Medium.default_budget())?;
//! ```

pub mod corpus;
pub mod fallback;
pub mod selector;
pub mod source;
pub mod surface;
pub mod truncate;
pub mod types;

// Re-export main types
pub use corpus::{Corpus, CorpusError, CorpusLoader, LoadReport, RejectedRecord, RejectionReason};
pub use fallback::{BuiltinFallbacks, FallbackProvider, StaticFallbacks, FALLBACK_ID_PREFIX};
pub use selector::{ContentSelector, SelectionError, SelectorConfig};
pub use source::{CorpusFormat, CorpusSource, FileCorpusSource, StaticCorpusSource};
pub use surface::{SurfaceBudget, SurfaceConfigError, SurfaceId, SurfaceTable};
pub use truncate::{truncate_at_word_boundary, DEFAULT_MARKER};
pub use types::*;
