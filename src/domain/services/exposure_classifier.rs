use crate::domain::value_objects::risk_level::RiskLevel;

/// Exposure above this multiple of the threshold is CRITICAL rather than HIGH
pub const CRITICAL_EXPOSURE_MULTIPLIER: f64 = 1.5;
/// Untriggered exposure at or above this ratio is tagged HIGH
pub const HIGH_TIER_RATIO: f64 = 0.75;
/// Untriggered exposure at or above this ratio is tagged MEDIUM
pub const MEDIUM_TIER_RATIO: f64 = 0.5;

/// Outcome of classifying one exposure against its threshold.
///
/// `tier` is the bookkeeping level written to the exposure store, `triggered`
/// decides whether an alert is raised. An entity between 75% and 100% of the
/// threshold is tagged HIGH without triggering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExposureAssessment {
    pub tier: RiskLevel,
    pub triggered: bool,
}

/// Classify an exposure against a positive threshold.
///
/// Reaching the threshold triggers; a triggered exposure is CRITICAL only when
/// strictly above 1.5x the threshold, HIGH otherwise.
pub fn classify(exposure: f64, threshold: f64) -> ExposureAssessment {
    let ratio = exposure / threshold;

    if ratio >= 1.0 {
        let tier = if exposure > threshold * CRITICAL_EXPOSURE_MULTIPLIER {
            RiskLevel::Critical
        } else {
            RiskLevel::High
        };
        return ExposureAssessment {
            tier,
            triggered: true,
        };
    }

    let tier = if ratio >= HIGH_TIER_RATIO {
        RiskLevel::High
    } else if ratio >= MEDIUM_TIER_RATIO {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    ExposureAssessment {
        tier,
        triggered: false,
    }
}
