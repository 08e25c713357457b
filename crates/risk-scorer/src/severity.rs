//! Severity Ranking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk level, ordered by severity.
///
/// Variant order is the rank: adding a level means inserting it here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl RiskLevel {
    /// Most severe level in `levels`, `Normal` when empty
    pub fn max_of(levels: impl IntoIterator<Item = RiskLevel>) -> RiskLevel {
        levels.into_iter().max().unwrap_or_default()
    }

    /// Whether this level calls for an alert
    pub fn is_alerting(&self) -> bool {
        *self > RiskLevel::Normal
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "normal",
            RiskLevel::Warning => "warning",
            RiskLevel::Critical => "critical",
        }
    }

    /// Badge shown by the zone risk indicator
    pub fn indicator(&self) -> &'static str {
        match self {
            RiskLevel::Normal => "SAFE",
            RiskLevel::Warning => "WARNING",
            RiskLevel::Critical => "DANGER",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_order() {
        assert!(RiskLevel::Critical > RiskLevel::Warning);
        assert!(RiskLevel::Warning > RiskLevel::Normal);
    }

    #[test]
    fn test_max_of() {
        use RiskLevel::*;
        assert_eq!(RiskLevel::max_of([Normal, Critical, Warning]), Critical);
        assert_eq!(RiskLevel::max_of([Normal, Warning, Normal]), Warning);
        assert_eq!(RiskLevel::max_of(std::iter::empty()), Normal);
    }

    #[test]
    fn test_indicator_labels() {
        assert_eq!(RiskLevel::Normal.indicator(), "SAFE");
        assert_eq!(RiskLevel::Critical.indicator(), "DANGER");
    }
}
