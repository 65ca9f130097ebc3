//! InsightRouter - turns a surface request into one bounded insight.
//!
//! The router is a stateless translation layer: it derives numbers from the
//! identity, merges them with context tags into [`SelectionKeys`], and asks
//! the selector for the budget registered for the surface. Errors from
//! either side are returned as distinct [`RouterError`] variants so callers
//! can tell "no usable identity, show generic content" apart from
//! "corpus misconfigured, alert".

use std::sync::Arc;

use insight_content::{ContentSelector, Corpus, SelectionError, SelectionKeys, SelectionResult, SurfaceBudget, SurfaceId};
use numerology::{is_valid_terminal, IdentityInput, InvalidInputError, NumerologyEngine, NumerologyProfile};
use tracing::{debug, info, warn};

use crate::config::{NumberSource, RouterConfig};
use crate::context::CosmicContextSnapshot;

/// Error types for routing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// Identity data cannot produce the requested number
    #[error("Invalid identity: {0}")]
    InvalidIdentity(#[from] InvalidInputError),

    /// Selection failed (unsupported surface or misconfigured corpus)
    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),

    /// Focus number outside the accepted 1-9 range
    #[error("Focus number out of range: {0}")]
    InvalidFocus(u32),

    /// Surface has no budget in the configured table
    #[error("Surface not registered: {0}")]
    UnregisteredSurface(SurfaceId),

    /// Context lacks a field the configured number source needs
    #[error("Context unavailable: {0}")]
    ContextUnavailable(String),
}

/// Per-surface outcome of [`InsightRouter::health_check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceHealth {
    pub surface: SurfaceId,
    pub budget: SurfaceBudget,
    /// Entries (fallbacks excluded) that fit this surface
    pub fitting_entries: usize,
    /// Whether some fallback fits this surface
    pub fallback_covered: bool,
}

/// Result of a startup health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub corpus_fingerprint: String,
    pub surfaces: Vec<SurfaceHealth>,
}

impl HealthReport {
    /// Whether every enabled surface is covered by a fallback.
    pub fn is_healthy(&self) -> bool {
        self.surfaces
            .iter()
            .all(|s| s.budget.is_disabled() || s.fallback_covered)
    }
}

/// Routes surface requests to the content selector.
#[derive(Debug, Clone)]
pub struct InsightRouter {
    config: RouterConfig,
    engine: NumerologyEngine,
    selector: ContentSelector,
}

impl InsightRouter {
    /// Create a router over a published corpus.
    pub fn new(corpus: Arc<Corpus>, config: RouterConfig) -> Self {
        let engine = if config.numerology.cache_enabled {
            NumerologyEngine::with_cache()
        } else {
            NumerologyEngine::new()
        };
        let selector = ContentSelector::new(corpus).with_config(config.selection.selector_config());

        Self {
            config,
            engine,
            selector,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The numerology engine (and its cache) used by this router.
    pub fn engine(&self) -> &NumerologyEngine {
        &self.engine
    }

    /// Full numerology profile for an identity.
    pub fn profile(&self, identity: &IdentityInput) -> Result<NumerologyProfile, RouterError> {
        Ok(self.engine.compute_profile(identity)?)
    }

    /// Personalized insight for `surface`.
    pub fn get_insight(
        &self,
        surface: SurfaceId,
        context: &CosmicContextSnapshot,
        identity: &IdentityInput,
    ) -> Result<SelectionResult, RouterError> {
        let budget = self.budget(surface)?;
        let keys = self.personalized_keys(context, identity)?;
        self.select(surface, &keys, budget)
    }

    /// Personalized insight keyed on a user-chosen focus number.
    pub fn get_insight_with_focus(
        &self,
        surface: SurfaceId,
        context: &CosmicContextSnapshot,
        identity: &IdentityInput,
        focus: u32,
    ) -> Result<SelectionResult, RouterError> {
        let budget = self.budget(surface)?;
        let focus = self.focus(focus)?;
        let keys = self.personalized_keys(context, identity)?;
        let keys = SelectionKeys {
            primary_number: Some(focus),
            ..keys
        };
        self.select(surface, &keys, budget)
    }

    /// Unpersonalized insight for callers with no identity.
    pub fn get_generic_insight(
        &self,
        surface: SurfaceId,
        context: &CosmicContextSnapshot,
    ) -> Result<SelectionResult, RouterError> {
        let budget = self.budget(surface)?;
        let keys = self.base_keys(context);
        self.select(surface, &keys, budget)
    }

    /// Enumerate registered surfaces against the corpus.
    pub fn health_check(&self) -> HealthReport {
        let corpus = self.selector.corpus();
        let surfaces: Vec<SurfaceHealth> = self
            .config
            .surfaces
            .iter()
            .map(|(surface, budget)| SurfaceHealth {
                surface,
                budget,
                fitting_entries: corpus.entries().iter().filter(|e| budget.fits(e.length())).count(),
                fallback_covered: corpus.fallbacks().iter().any(|f| budget.fits(f.length())),
            })
            .collect();

        let report = HealthReport {
            corpus_fingerprint: corpus.fingerprint().to_string(),
            surfaces,
        };
        for health in report.surfaces.iter().filter(|s| !s.budget.is_disabled() && !s.fallback_covered) {
            warn!(surface = %health.surface, "No fallback fits surface");
        }
        info!(
            fingerprint = %report.corpus_fingerprint,
            healthy = report.is_healthy(),
            "Insight router health check"
        );
        report
    }

    fn budget(&self, surface: SurfaceId) -> Result<SurfaceBudget, RouterError> {
        self.config
            .surfaces
            .budget(surface)
            .ok_or(RouterError::UnregisteredSurface(surface))
    }

    fn base_keys(&self, context: &CosmicContextSnapshot) -> SelectionKeys {
        let rotation_key = self.config.selection.rotation.key(context.timestamp);
        SelectionKeys::new(rotation_key).with_tags(context.derived_tags())
    }

    fn personalized_keys(
        &self,
        context: &CosmicContextSnapshot,
        identity: &IdentityInput,
    ) -> Result<SelectionKeys, RouterError> {
        let profile = self.engine.compute_profile(identity)?;
        let primary = self.primary_number(&profile, context)?;

        Ok(self
            .base_keys(context)
            .with_primary(primary)
            .with_tag(format!("life-path-{}", profile.life_path_number))
            .with_tag(format!("soul-urge-{}", profile.soul_urge_number))
            .with_tag(format!("expression-{}", profile.expression_number)))
    }

    fn primary_number(&self, profile: &NumerologyProfile, context: &CosmicContextSnapshot) -> Result<u32, RouterError> {
        match self.config.numerology.primary_source {
            NumberSource::LifePath => Ok(profile.life_path_number),
            NumberSource::SoulUrge => Ok(profile.soul_urge_number),
            NumberSource::Expression => Ok(profile.expression_number),
            NumberSource::Focus(n) => self.focus(n),
            NumberSource::Realm => match context.realm_number {
                Some(realm) if is_valid_terminal(realm) => Ok(realm),
                Some(realm) => Err(RouterError::ContextUnavailable(format!(
                    "realm number {realm} is not a valid numerology value"
                ))),
                None => Err(RouterError::ContextUnavailable("realm number missing".to_string())),
            },
        }
    }

    fn focus(&self, focus: u32) -> Result<u32, RouterError> {
        self.engine
            .validate_focus_number(focus)
            .map_err(|_| RouterError::InvalidFocus(focus))
    }

    fn select(&self, surface: SurfaceId, keys: &SelectionKeys, budget: SurfaceBudget) -> Result<SelectionResult, RouterError> {
        let result = self.selector.select(keys, budget)?;
        debug!(
            surface = %surface,
            entry_id = %result.source_entry_id,
            stage = ?result.stage,
            primary = ?keys.primary_number,
            "Routed insight"
        );
        Ok(result)
    }
}
