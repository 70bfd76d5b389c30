use async_trait::async_trait;
use tracing::{debug, warn};

use crate::application::services::notification_dispatcher::NotificationChannel;
use crate::domain::entities::alert::Alert;
use crate::domain::errors::NotificationError;
use crate::domain::services::alert_factory::format_currency;

/// Writes alerts to the tracing log at `warn`
#[derive(Debug, Clone, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

/// Multi-line human readable rendering of an alert
pub fn format_alert(alert: &Alert) -> String {
    format!(
        "RISK ALERT - {}\nType: {}\nEntity: {} - {}\nTime: {}\n\n{}\n\nThreshold: {}\nCurrent Value: {}",
        alert.severity,
        alert.alert_type,
        alert.entity_type,
        alert.entity_id,
        alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
        alert.message,
        format_currency(alert.threshold_value),
        format_currency(alert.current_value)
    )
}

#[async_trait]
impl NotificationChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), NotificationError> {
        warn!(
            severity = %alert.severity,
            alert_type = %alert.alert_type,
            entity = %alert.entity_id,
            "[ALERT] {}",
            alert.message
        );
        debug!("{}", format_alert(alert));
        Ok(())
    }
}
