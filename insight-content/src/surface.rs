//! Display surfaces and their character budgets.
//!
//! Budgets are compile-time constants, optionally overridden by startup
//! configuration. They are never derived from runtime state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Display surfaces an insight can be rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceId {
    /// Small home-screen widget (icon-sized, no room for text)
    Small,
    /// Lock-screen rectangular accessory
    Rectangular,
    /// Medium home-screen widget
    Medium,
    /// Large home-screen widget
    Large,
    /// Circular watch complication (no room for text)
    Circular,
    /// Inline lock-screen line
    Inline,
}

impl SurfaceId {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Rectangular => "rectangular",
            Self::Medium => "medium",
            Self::Large => "large",
            Self::Circular => "circular",
            Self::Inline => "inline",
        }
    }

    /// All known surfaces
    pub fn all() -> [Self; 6] {
        [
            Self::Small,
            Self::Rectangular,
            Self::Medium,
            Self::Large,
            Self::Circular,
            Self::Inline,
        ]
    }

    /// Compile-time default budget for this surface
    pub const fn default_budget(&self) -> SurfaceBudget {
        match self {
            Self::Small => SurfaceBudget::DISABLED,
            Self::Rectangular => SurfaceBudget::new(8, 20),
            Self::Medium => SurfaceBudget::new(16, 40),
            Self::Large => SurfaceBudget::new(40, 120),
            Self::Circular => SurfaceBudget::DISABLED,
            Self::Inline => SurfaceBudget::new(4, 12),
        }
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive character range a surface can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SurfaceBudget {
    /// Minimum length, avoids near-empty results
    pub min: usize,
    /// Maximum length; zero means the surface cannot render text
    pub max: usize,
}

impl SurfaceBudget {
    /// A surface that cannot render text.
    pub const DISABLED: Self = Self { min: 0, max: 0 };

    /// Create a budget.
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    /// Whether this surface cannot render any text.
    pub fn is_disabled(&self) -> bool {
        self.max == 0
    }

    /// Whether a text of `length` characters fits.
    pub fn fits(&self, length: usize) -> bool {
        !self.is_disabled() && length >= self.min && length <= self.max
    }
}

/// Error for an inconsistent surface table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurfaceConfigError {
    /// Minimum above maximum
    #[error("Surface {surface}: min {min} exceeds max {max}")]
    InvertedBudget {
        surface: SurfaceId,
        min: usize,
        max: usize,
    },
}

/// Mapping from surface to budget, owned by the integrating application.
///
/// Deserialized maps are overrides applied on top of the defaults; a
/// `{min: 0, max: 0}` override disables a surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<SurfaceId, SurfaceBudget>",
    into = "BTreeMap<SurfaceId, SurfaceBudget>"
)]
pub struct SurfaceTable {
    budgets: BTreeMap<SurfaceId, SurfaceBudget>,
}

impl From<BTreeMap<SurfaceId, SurfaceBudget>> for SurfaceTable {
    fn from(overrides: BTreeMap<SurfaceId, SurfaceBudget>) -> Self {
        Self::default().with_overrides(overrides)
    }
}

impl From<SurfaceTable> for BTreeMap<SurfaceId, SurfaceBudget> {
    fn from(table: SurfaceTable) -> Self {
        table.budgets
    }
}

impl Default for SurfaceTable {
    fn default() -> Self {
        Self {
            budgets: SurfaceId::all()
                .into_iter()
                .map(|id| (id, id.default_budget()))
                .collect(),
        }
    }
}

impl SurfaceTable {
    /// A table with no registered surfaces.
    pub fn empty() -> Self {
        Self {
            budgets: BTreeMap::new(),
        }
    }

    /// Builder: register or override a surface budget.
    pub fn with_budget(mut self, surface: SurfaceId, budget: SurfaceBudget) -> Self {
        self.budgets.insert(surface, budget);
        self
    }

    /// Builder: apply several overrides.
    pub fn with_overrides(self, overrides: impl IntoIterator<Item = (SurfaceId, SurfaceBudget)>) -> Self {
        overrides
            .into_iter()
            .fold(self, |table, (surface, budget)| table.with_budget(surface, budget))
    }

    /// Budget registered for `surface`.
    pub fn budget(&self, surface: SurfaceId) -> Option<SurfaceBudget> {
        self.budgets.get(&surface).copied()
    }

    /// All registered surfaces with their budgets.
    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, SurfaceBudget)> + '_ {
        self.budgets.iter().map(|(id, budget)| (*id, *budget))
    }

    /// Registered surfaces that can render text.
    pub fn enabled(&self) -> impl Iterator<Item = (SurfaceId, SurfaceBudget)> + '_ {
        self.iter().filter(|(_, budget)| !budget.is_disabled())
    }

    /// Largest maximum across enabled surfaces.
    pub fn largest_max(&self) -> Option<usize> {
        self.enabled().map(|(_, b)| b.max).max()
    }

    /// Smallest minimum across enabled surfaces.
    pub fn smallest_min(&self) -> Option<usize> {
        self.enabled().map(|(_, b)| b.min).min()
    }

    /// Check every budget is well-formed.
    pub fn validate(&self) -> Result<(), SurfaceConfigError> {
        for (surface, budget) in self.iter() {
            if budget.min > budget.max {
                return Err(SurfaceConfigError::InvertedBudget {
                    surface,
                    min: budget.min,
                    max: budget.max,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budgets() {
        let table = SurfaceTable::default();
        assert_eq!(table.budget(SurfaceId::Small), Some(SurfaceBudget::DISABLED));
        assert_eq!(table.budget(SurfaceId::Medium), Some(SurfaceBudget::new(16, 40)));
        assert_eq!(table.budget(SurfaceId::Large), Some(SurfaceBudget::new(40, 120)));
        assert_eq!(table.budget(SurfaceId::Rectangular), Some(SurfaceBudget::new(8, 20)));
        assert_eq!(table.largest_max(), Some(120));
        assert_eq!(table.smallest_min(), Some(4));
        assert!(table.validate().is_ok());
    }

    #[test]
    fn test_disabled_budget_fits_nothing() {
        let budget = SurfaceBudget::DISABLED;
        assert!(budget.is_disabled());
        assert!(!budget.fits(0));
        assert!(!budget.fits(5));
    }

    #[test]
    fn test_inverted_budget_rejected() {
        let table = SurfaceTable::default().with_budget(SurfaceId::Inline, SurfaceBudget::new(30, 10));
        assert_eq!(
            table.validate(),
            Err(SurfaceConfigError::InvertedBudget {
                surface: SurfaceId::Inline,
                min: 30,
                max: 10
            })
        );
    }

    #[test]
    fn test_deserialized_map_overrides_defaults() {
        let table: SurfaceTable = serde_json::from_str(
            r#"{"medium": {"min": 10, "max": 30}, "inline": {"min": 0, "max": 0}}"#,
        )
        .unwrap();
        assert_eq!(table.budget(SurfaceId::Medium), Some(SurfaceBudget::new(10, 30)));
        assert_eq!(table.budget(SurfaceId::Inline), Some(SurfaceBudget::DISABLED));
        assert_eq!(table.budget(SurfaceId::Large), Some(SurfaceBudget::new(40, 120)));
        assert_eq!(table.budget(SurfaceId::Rectangular), Some(SurfaceBudget::new(8, 20)));
        assert_eq!(table.iter().count(), SurfaceId::all().len());
    }

    #[test]
    fn test_serialized_table_reloads_unchanged() {
        let table = SurfaceTable::default().with_budget(SurfaceId::Large, SurfaceBudget::new(30, 100));
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(serde_json::from_str::<SurfaceTable>(&json).unwrap(), table);
    }

    #[test]
    fn test_unknown_budget_field_rejected() {
        let parsed = serde_json::from_str::<SurfaceTable>(r#"{"medium": {"min": 10, "maximum": 30}}"#);
        assert!(parsed.is_err());
    }
}
