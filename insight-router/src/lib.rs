//! Insight Router for Vybe
//!
//! The composition layer between the host app and the insight core:
//!
//! 1. Look up the character budget registered for the requested surface
//! 2. Derive numerology values from the identity
//! 3. Merge them with cosmic context tags into selection keys
//! 4. Select one insight that fits the budget
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use insight_router::{CosmicContextSnapshot, InsightRouter, RouterConfig};
//!
//! let router = InsightRouter::new(Arc::new(Corpus::builtin()?), RouterConfig::default());
//! let insight = router.get_insight(SurfaceId::Medium, &context, &identity)?;
//! ```

pub mod config;
pub mod context;
pub mod router;

// Re-export main types
pub use config::{ConfigError, NumberSource, NumerologyConfig, RouterConfig, SelectionConfig};
pub use context::{CosmicContextSnapshot, RotationWindow};
pub use router::{HealthReport, InsightRouter, RouterError, SurfaceHealth};

pub use insight_content::{Corpus, SelectionResult, SelectionStage, SurfaceBudget, SurfaceId};
pub use numerology::{IdentityInput, InvalidInputError, NumerologyProfile};
