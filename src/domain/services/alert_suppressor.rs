use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::entities::alert::{Alert, AlertType, EntityType};

type AlertKey = (AlertType, EntityType, String);

/// Optional per-entity alert cooldown.
///
/// With a zero cooldown every alert passes, which keeps the one-alert-per-
/// triggering-evaluation behaviour. With a positive cooldown, a repeat of the
/// same (type, entity) within the cooldown of the last admitted alert is
/// suppressed.
#[derive(Debug, Clone)]
pub struct AlertSuppressor {
    cooldown: chrono::Duration,
    last_admitted: HashMap<AlertKey, DateTime<Utc>>,
}

impl AlertSuppressor {
    pub fn new(cooldown: Duration) -> Self {
        // Anything beyond chrono's range is effectively "forever"
        let cooldown =
            chrono::Duration::from_std(cooldown).unwrap_or_else(|_| chrono::Duration::weeks(5200));
        Self {
            cooldown,
            last_admitted: HashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.cooldown > chrono::Duration::zero()
    }

    /// Returns true if the alert should be emitted, recording it as admitted
    pub fn admit(&mut self, alert: &Alert) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let key = (alert.alert_type, alert.entity_type, alert.entity_id.clone());
        if let Some(last) = self.last_admitted.get(&key) {
            if alert.timestamp < *last + self.cooldown {
                return false;
            }
        }

        self.last_admitted.insert(key, alert.timestamp);
        true
    }
}
