use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::entities::alert::Alert;
use crate::domain::errors::NotificationError;
use crate::domain::repositories::AlertNotifier;

/// A single delivery route for alerts (log, chat webhook, ...)
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, alert: &Alert) -> Result<(), NotificationError>;
}

/// Fans an alert out to every configured channel concurrently.
///
/// Channel failures are logged here and never reach the engine.
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: Arc<dyn NotificationChannel>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn channel_names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[async_trait]
impl AlertNotifier for NotificationDispatcher {
    async fn send(&self, alert: &Alert) {
        if self.channels.is_empty() {
            debug!(
                "No notification channels configured, dropping {} alert for {}",
                alert.alert_type, alert.entity_id
            );
            return;
        }

        let deliveries = self.channels.iter().map(|channel| async move {
            (channel.name().to_string(), channel.deliver(alert).await)
        });

        for (name, result) in join_all(deliveries).await {
            if let Err(e) = result {
                error!(
                    "Failed to deliver {} alert for {} via {}: {}",
                    alert.alert_type, alert.entity_id, name, e
                );
            }
        }
    }
}
