//! Configuration for the insight router.

use insight_content::{SelectorConfig, SurfaceConfigError, SurfaceTable, DEFAULT_MARKER};
use numerology::InvalidInputError;
use serde::{Deserialize, Serialize};

use crate::context::RotationWindow;

/// Error types for configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// YAML could not be parsed or produced
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Surface table is inconsistent
    #[error(transparent)]
    Surface(#[from] SurfaceConfigError),

    /// Configured focus number is out of range
    #[error("Invalid focus number: {0}")]
    Focus(#[source] InvalidInputError),

    /// Truncation marker must not be empty
    #[error("Truncation marker must not be empty")]
    EmptyMarker,
}

/// Which number drives content selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberSource {
    /// Life path from the birth date
    #[default]
    LifePath,
    /// Soul urge from the vowels of the name
    SoulUrge,
    /// Expression from every letter of the name
    Expression,
    /// Realm number from the cosmic context
    Realm,
    /// A fixed, user-chosen focus number (1-9)
    Focus(u32),
}

impl NumberSource {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LifePath => "life_path",
            Self::SoulUrge => "soul_urge",
            Self::Expression => "expression",
            Self::Realm => "realm",
            Self::Focus(_) => "focus",
        }
    }
}

/// Configuration for an [`InsightRouter`](crate::InsightRouter).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Surface budget overrides on top of the defaults
    pub surfaces: SurfaceTable,
    /// Selection configuration
    pub selection: SelectionConfig,
    /// Numerology configuration
    pub numerology: NumerologyConfig,
}

impl RouterConfig {
    /// Load config from YAML and validate it.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.surfaces.validate()?;
        if self.selection.truncation_marker.is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if let NumberSource::Focus(n) = self.numerology.primary_source {
            numerology::NumerologyEngine::new()
                .validate_focus_number(n)
                .map_err(ConfigError::Focus)?;
        }
        Ok(())
    }
}

/// Selection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    /// How often results rotate
    pub rotation: RotationWindow,
    /// Permit word-boundary truncation when nothing fits
    pub allow_truncation: bool,
    /// Continuation marker appended to truncated text
    pub truncation_marker: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            rotation: RotationWindow::default(),
            allow_truncation: false,
            truncation_marker: DEFAULT_MARKER.to_string(),
        }
    }
}

impl SelectionConfig {
    /// Selector settings carried by this section.
    pub fn selector_config(&self) -> SelectorConfig {
        SelectorConfig {
            allow_truncation: self.allow_truncation,
            truncation_marker: self.truncation_marker.clone(),
        }
    }
}

/// Numerology configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumerologyConfig {
    /// Number used as the primary selection key
    pub primary_source: NumberSource,
    /// Memoize profiles per (name, birth date)
    pub cache_enabled: bool,
}

impl Default for NumerologyConfig {
    fn default() -> Self {
        Self {
            primary_source: NumberSource::LifePath,
            cache_enabled: true,
        }
    }
}
