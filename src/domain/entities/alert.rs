use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::risk_level::Severity;

/// Kind of check that produced an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    HighClientExposure,
    HighSymbolExposure,
    HighTransactionVelocity,
    AnomalyDetected,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::HighClientExposure => "HIGH_CLIENT_EXPOSURE",
            AlertType::HighSymbolExposure => "HIGH_SYMBOL_EXPOSURE",
            AlertType::HighTransactionVelocity => "HIGH_TRANSACTION_VELOCITY",
            AlertType::AnomalyDetected => "ANOMALY_DETECTED",
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH_CLIENT_EXPOSURE" => Ok(AlertType::HighClientExposure),
            "HIGH_SYMBOL_EXPOSURE" => Ok(AlertType::HighSymbolExposure),
            "HIGH_TRANSACTION_VELOCITY" => Ok(AlertType::HighTransactionVelocity),
            "ANOMALY_DETECTED" => Ok(AlertType::AnomalyDetected),
            other => Err(format!("Unknown alert type: {}", other)),
        }
    }
}

/// Entity an alert is raised against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    Client,
    Symbol,
    System,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Client => "CLIENT",
            EntityType::Symbol => "SYMBOL",
            EntityType::System => "SYSTEM",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(EntityType::Client),
            "SYMBOL" => Ok(EntityType::Symbol),
            "SYSTEM" => Ok(EntityType::System),
            other => Err(format!("Unknown entity type: {}", other)),
        }
    }
}

/// Alert payload before the sink assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub alert_type: AlertType,
    pub severity: Severity,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub message: String,
    pub threshold_value: f64,
    pub current_value: f64,
    pub acknowledged: bool,
}

/// Alert as stored by the sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAlert {
    pub id: i64,
    pub alert: Alert,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}
