use super::numeric_window::NumericWindow;
use crate::domain::value_objects::risk_level::{RiskLevel, Severity};

/// Anomaly detector settings
#[derive(Debug, Clone)]
pub struct AnomalyConfig {
    /// Number of recent values kept as the baseline
    pub window_size: usize,
    /// Baseline size required before any value is scored
    pub min_samples: usize,
    /// z-score above which a value is flagged
    pub z_threshold: f64,
    /// z-score at or above which a flagged value is HIGH instead of MEDIUM
    pub high_severity_z: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            min_samples: 30,
            z_threshold: 3.0,
            high_severity_z: 4.0,
        }
    }
}

/// A value flagged as a statistical outlier against the baseline it was
/// scored with
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyFinding {
    pub value: f64,
    pub z_score: f64,
    pub severity: Severity,
    pub mean: f64,
    pub stddev: f64,
    /// Value at which the z-score reaches the flagging threshold
    pub threshold_value: f64,
}

/// Rolling z-score outlier detector over a single global baseline.
///
/// Every call to [`evaluate`](Self::evaluate) scores the value first and then
/// adds it to the baseline, so a value never biases its own score. Evaluating
/// the same value twice is therefore not idempotent: the second call sees a
/// baseline that already contains the first.
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
    window: NumericWindow,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        let window = NumericWindow::new(config.window_size);
        Self { config, window }
    }

    /// Score `value` against the current baseline, then push it.
    ///
    /// Returns `None` when the baseline holds fewer than `min_samples` values,
    /// when its stddev is zero, or when the z-score does not exceed the threshold.
    pub fn evaluate(&mut self, value: f64) -> Option<AnomalyFinding> {
        let finding = self.score(value);
        self.window.push(value);
        finding
    }

    /// Score `value` without touching the baseline
    pub fn score(&self, value: f64) -> Option<AnomalyFinding> {
        if self.window.len() < self.config.min_samples {
            return None;
        }

        let stddev = self.window.stddev();
        if stddev == 0.0 {
            return None;
        }

        let mean = self.window.mean();
        let z_score = (value - mean).abs() / stddev;
        if z_score <= self.config.z_threshold {
            return None;
        }

        let severity = if z_score < self.config.high_severity_z {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        Some(AnomalyFinding {
            value,
            z_score,
            severity,
            mean,
            stddev,
            threshold_value: mean + self.config.z_threshold * stddev,
        })
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    pub fn window(&self) -> &NumericWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Baseline of 30 samples with mean 1000 and population stddev 100
    fn seeded_detector() -> AnomalyDetector {
        let mut detector = AnomalyDetector::new(AnomalyConfig::default());
        for i in 0..30 {
            let v = if i % 2 == 0 { 900.0 } else { 1100.0 };
            assert!(detector.evaluate(v).is_none());
        }
        detector
    }

    #[test]
    fn test_no_result_below_min_samples() {
        let mut detector = AnomalyDetector::new(AnomalyConfig::default());
        for i in 0..29 {
            let v = if i % 2 == 0 { 900.0 } else { 1100.0 };
            detector.evaluate(v);
        }
        assert_eq!(detector.sample_count(), 29);
        assert!(detector.evaluate(1_000_000.0).is_none());
    }

    #[test]
    fn test_no_result_for_zero_variance() {
        let mut detector = AnomalyDetector::new(AnomalyConfig::default());
        for _ in 0..50 {
            detector.evaluate(500.0);
        }
        assert!(detector.evaluate(5_000_000.0).is_none());
        assert!(detector.score(500.0).is_none());
    }

    #[test]
    fn test_tight_baseline_at_large_values_still_flags() {
        let mut detector = AnomalyDetector::new(AnomalyConfig::default());
        for i in 0..30 {
            let v = if i % 2 == 0 { 999_999.5 } else { 1_000_000.5 };
            assert!(detector.evaluate(v).is_none());
        }

        let finding = detector
            .evaluate(1_000_010.0)
            .expect("ten dollars over a half-dollar spread is an outlier");
        assert!((finding.z_score - 20.0).abs() < 1e-6);
        assert_eq!(finding.severity, RiskLevel::High);
    }

    #[test]
    fn test_moderate_outlier_is_medium() {
        let mut detector = seeded_detector();
        let finding = detector.evaluate(1350.0).expect("1350 should be flagged");
        assert!((finding.z_score - 3.5).abs() < 1e-9);
        assert_eq!(finding.severity, RiskLevel::Medium);
        assert!((finding.mean - 1000.0).abs() < 1e-9);
        assert!((finding.stddev - 100.0).abs() < 1e-9);
        assert!((finding.threshold_value - 1300.0).abs() < 1e-9);
    }

    #[test]
    fn test_extreme_outlier_is_high() {
        let mut detector = seeded_detector();
        let finding = detector.evaluate(1450.0).expect("1450 should be flagged");
        assert_eq!(finding.severity, RiskLevel::High);

        let mut detector = seeded_detector();
        let finding = detector.evaluate(1400.0).expect("z of exactly 4 is flagged");
        assert_eq!(finding.severity, RiskLevel::High);
    }

    #[test]
    fn test_low_side_outliers_are_flagged() {
        let mut detector = seeded_detector();
        let finding = detector.evaluate(650.0).expect("650 should be flagged");
        assert!((finding.z_score - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_z_at_threshold_is_not_flagged() {
        let mut detector = seeded_detector();
        assert!(detector.evaluate(1300.0).is_none());
    }

    #[test]
    fn test_value_is_scored_before_it_joins_the_baseline() {
        let mut detector = seeded_detector();
        assert_eq!(detector.sample_count(), 30);

        let first = detector.evaluate(1350.0);
        assert!(first.is_some());
        // The evaluated value is pushed after scoring
        assert_eq!(detector.sample_count(), 31);
        assert_eq!(detector.window().iter().last().copied(), Some(1350.0));

        // Re-evaluating the same value sees a shifted baseline, so results differ
        let second = detector.evaluate(1350.0).expect("still an outlier");
        assert!(second.z_score < first.unwrap().z_score);
    }

    #[test]
    fn test_score_does_not_mutate_baseline() {
        let detector = seeded_detector();
        let a = detector.score(1350.0);
        let b = detector.score(1350.0);
        assert_eq!(a, b);
        assert_eq!(detector.sample_count(), 30);
    }
}
