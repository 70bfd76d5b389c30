//! Alert construction
//!
//! Turns classifier, velocity and anomaly outputs into uniform [`Alert`]
//! payloads. No deduplication happens here: every call yields one alert.

use chrono::Utc;
use std::time::Duration;

use super::anomaly_detector::AnomalyFinding;
use super::exposure_classifier::ExposureAssessment;
use crate::domain::entities::alert::{Alert, AlertType, EntityType};
use crate::domain::entities::exposure::ExposureKind;
use crate::domain::value_objects::risk_level::RiskLevel;

/// Entity id used for alerts raised by the global anomaly detector
pub const ANOMALY_ENTITY_ID: &str = "TRANSACTION_MONITOR";

pub struct AlertFactory;

impl AlertFactory {
    /// Alert for an exposure that reached its threshold; severity is the tier
    pub fn exposure_alert(
        kind: ExposureKind,
        key: &str,
        exposure: f64,
        threshold: f64,
        assessment: ExposureAssessment,
    ) -> Alert {
        let (alert_type, entity_type, label) = match kind {
            ExposureKind::Client => (AlertType::HighClientExposure, EntityType::Client, "Client"),
            ExposureKind::Symbol => (AlertType::HighSymbolExposure, EntityType::Symbol, "Symbol"),
        };

        Self::build(
            alert_type,
            assessment.tier,
            entity_type,
            key,
            format!(
                "{} {} exposure {} exceeds threshold {}",
                label,
                key,
                format_currency(exposure),
                format_currency(threshold)
            ),
            threshold,
            exposure,
        )
    }

    /// Alert for an entity whose recent transaction count exceeded the threshold
    pub fn velocity_alert(
        entity_type: EntityType,
        entity_id: &str,
        recent_count: usize,
        threshold: u32,
        window: Duration,
    ) -> Alert {
        Self::build(
            AlertType::HighTransactionVelocity,
            RiskLevel::High,
            entity_type,
            entity_id,
            format!(
                "{} {} has {} transactions in last {}s (threshold: {})",
                entity_type,
                entity_id,
                recent_count,
                window.as_secs(),
                threshold
            ),
            threshold as f64,
            recent_count as f64,
        )
    }

    /// Alert for a transaction value flagged by the anomaly detector
    pub fn anomaly_alert(finding: &AnomalyFinding) -> Alert {
        Self::build(
            AlertType::AnomalyDetected,
            finding.severity,
            EntityType::System,
            ANOMALY_ENTITY_ID,
            format!(
                "Anomalous transaction value {} detected (z-score: {:.2}, mean: {}, std: {})",
                format_currency(finding.value),
                finding.z_score,
                format_currency(finding.mean),
                format_currency(finding.stddev)
            ),
            finding.threshold_value,
            finding.value,
        )
    }

    fn build(
        alert_type: AlertType,
        severity: RiskLevel,
        entity_type: EntityType,
        entity_id: &str,
        message: String,
        threshold_value: f64,
        current_value: f64,
    ) -> Alert {
        Alert {
            timestamp: Utc::now(),
            alert_type,
            severity,
            entity_type,
            entity_id: entity_id.to_string(),
            message,
            threshold_value,
            current_value,
            acknowledged: false,
        }
    }
}

/// Format a monetary amount as `$1,234,567.89`
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, cents) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::exposure_classifier::classify;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(999.5), "$999.50");
        assert_eq!(format_currency(1_000.0), "$1,000.00");
        assert_eq!(format_currency(1_250_000.0), "$1,250,000.00");
        assert_eq!(format_currency(-12_345.678), "-$12,345.68");
    }

    #[test]
    fn test_client_exposure_alert_fields() {
        let assessment = classify(1_250_000.0, 1_000_000.0);
        let alert = AlertFactory::exposure_alert(
            ExposureKind::Client,
            "CLIENT_001",
            1_250_000.0,
            1_000_000.0,
            assessment,
        );

        assert_eq!(alert.alert_type, AlertType::HighClientExposure);
        assert_eq!(alert.severity, RiskLevel::High);
        assert_eq!(alert.entity_type, EntityType::Client);
        assert_eq!(alert.entity_id, "CLIENT_001");
        assert_eq!(alert.threshold_value, 1_000_000.0);
        assert_eq!(alert.current_value, 1_250_000.0);
        assert!(!alert.acknowledged);
        assert_eq!(
            alert.message,
            "Client CLIENT_001 exposure $1,250,000.00 exceeds threshold $1,000,000.00"
        );
    }

    #[test]
    fn test_symbol_exposure_alert_uses_critical_tier() {
        let assessment = classify(850_000.0, 500_000.0);
        let alert =
            AlertFactory::exposure_alert(ExposureKind::Symbol, "AAPL", 850_000.0, 500_000.0, assessment);
        assert_eq!(alert.alert_type, AlertType::HighSymbolExposure);
        assert_eq!(alert.entity_type, EntityType::Symbol);
        assert_eq!(alert.severity, RiskLevel::Critical);
    }

    #[test]
    fn test_velocity_alert_fields() {
        let alert = AlertFactory::velocity_alert(
            EntityType::Client,
            "CLIENT_005",
            15,
            10,
            Duration::from_secs(60),
        );
        assert_eq!(alert.alert_type, AlertType::HighTransactionVelocity);
        assert_eq!(alert.severity, RiskLevel::High);
        assert_eq!(alert.current_value, 15.0);
        assert_eq!(alert.threshold_value, 10.0);
        assert_eq!(
            alert.message,
            "CLIENT CLIENT_005 has 15 transactions in last 60s (threshold: 10)"
        );
    }

    #[test]
    fn test_anomaly_alert_fields() {
        let finding = AnomalyFinding {
            value: 1350.0,
            z_score: 3.5,
            severity: RiskLevel::Medium,
            mean: 1000.0,
            stddev: 100.0,
            threshold_value: 1300.0,
        };
        let alert = AlertFactory::anomaly_alert(&finding);
        assert_eq!(alert.alert_type, AlertType::AnomalyDetected);
        assert_eq!(alert.entity_type, EntityType::System);
        assert_eq!(alert.entity_id, ANOMALY_ENTITY_ID);
        assert_eq!(alert.severity, RiskLevel::Medium);
        assert_eq!(alert.threshold_value, 1300.0);
        assert_eq!(alert.current_value, 1350.0);
        assert!(alert.message.contains("z-score: 3.50"));
    }
}
