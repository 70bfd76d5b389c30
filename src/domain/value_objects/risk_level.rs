use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse risk classification shared by exposure tiers and alert severities.
///
/// Ordered from least to most severe so tiers can be compared directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Alert severities use the same four-step scale as exposure tiers.
pub type Severity = RiskLevel;

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    /// True for HIGH and CRITICAL, the levels counted as high-risk in metrics.
    pub fn is_high_risk(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            "CRITICAL" => Ok(RiskLevel::Critical),
            other => Err(format!("Unknown risk level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_string_round_trip() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            assert_eq!(level.as_str().parse::<RiskLevel>().unwrap(), level);
        }
        assert_eq!("critical".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert!("SEVERE".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_high_risk_levels() {
        assert!(!RiskLevel::Low.is_high_risk());
        assert!(!RiskLevel::Medium.is_high_risk());
        assert!(RiskLevel::High.is_high_risk());
        assert!(RiskLevel::Critical.is_high_risk());
    }

    #[test]
    fn test_serde_uses_uppercase_names() {
        let json = serde_json::to_string(&RiskLevel::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }
}
