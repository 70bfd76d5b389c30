use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::application::services::notification_dispatcher::NotificationChannel;
use crate::domain::entities::alert::Alert;
use crate::domain::errors::NotificationError;
use crate::domain::services::alert_factory::format_currency;
use crate::domain::value_objects::risk_level::Severity;

const SLACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Slack incoming-webhook message
#[derive(Debug, Serialize)]
pub struct SlackPayload {
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
pub struct SlackAttachment {
    pub color: String,
    pub title: String,
    pub text: String,
    pub fields: Vec<SlackField>,
    pub footer: String,
    pub ts: i64,
}

#[derive(Debug, Serialize)]
pub struct SlackField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "#36a64f",
        Severity::Medium => "#ff9900",
        Severity::High => "#ff6600",
        Severity::Critical => "#ff0000",
    }
}

impl SlackPayload {
    pub fn from_alert(alert: &Alert) -> Self {
        let field = |title: &str, value: String| SlackField {
            title: title.to_string(),
            value,
            short: true,
        };

        Self {
            attachments: vec![SlackAttachment {
                color: severity_color(alert.severity).to_string(),
                title: format!("{} - {}", alert.alert_type, alert.severity),
                text: alert.message.clone(),
                fields: vec![
                    field(
                        "Entity",
                        format!("{}: {}", alert.entity_type, alert.entity_id),
                    ),
                    field("Threshold", format_currency(alert.threshold_value)),
                    field("Current Value", format_currency(alert.current_value)),
                ],
                footer: "Risk Alert System".to_string(),
                ts: alert.timestamp.timestamp(),
            }],
        }
    }
}

/// Posts alerts to a Slack incoming webhook
#[derive(Debug, Clone)]
pub struct SlackWebhookChannel {
    client: Client,
    webhook_url: url::Url,
}

impl SlackWebhookChannel {
    pub fn new(webhook_url: url::Url) -> Result<Self, NotificationError> {
        let client = Client::builder().timeout(SLACK_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url,
        })
    }
}

#[async_trait]
impl NotificationChannel for SlackWebhookChannel {
    fn name(&self) -> &str {
        "slack"
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), NotificationError> {
        let payload = SlackPayload::from_alert(alert);

        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!(
                "Slack webhook returned {} - {}",
                status, body
            )));
        }

        debug!("Delivered {} alert to Slack", alert.alert_type);
        Ok(())
    }
}
