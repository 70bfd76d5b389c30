//! Database Models
//!
//! Row types for the risk tables and their conversions to domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tracing::warn;

use crate::domain::entities::alert::{Alert, StoredAlert};
use crate::domain::entities::exposure::EntityExposure;
use crate::domain::entities::metrics_snapshot::MetricsSnapshot;
use crate::domain::entities::transaction::{Transaction, TransactionSide};
use crate::domain::errors::StoreError;
use crate::domain::value_objects::risk_level::RiskLevel;

/// Transaction record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransactionRecord {
    pub transaction_id: i64,
    pub timestamp: DateTime<Utc>,
    pub client_id: String,
    pub symbol: String,
    pub transaction_type: String, // "BUY" or "SELL"
    pub quantity: i64,
    pub price: f64,
    pub total_value: f64,
    pub broker_id: String,
    pub market: String,
}

impl TryFrom<TransactionRecord> for Transaction {
    type Error = StoreError;

    fn try_from(record: TransactionRecord) -> Result<Self, Self::Error> {
        let side: TransactionSide = record.transaction_type.parse().map_err(|e| {
            StoreError::Decode(format!("transaction {}: {}", record.transaction_id, e))
        })?;

        Ok(Transaction {
            id: record.transaction_id,
            client_id: record.client_id,
            symbol: record.symbol,
            side,
            quantity: record.quantity,
            price: record.price,
            total_value: record.total_value,
            broker_id: record.broker_id,
            market: record.market,
            timestamp: record.timestamp,
        })
    }
}

/// New transaction input; the id is assigned by the database
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub client_id: String,
    pub symbol: String,
    pub side: TransactionSide,
    pub quantity: i64,
    pub price: f64,
    pub broker_id: String,
    pub market: String,
    pub timestamp: DateTime<Utc>,
}

impl NewTransaction {
    pub fn total_value(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

/// Exposure row, selected from either exposure table with aliased columns
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExposureRecord {
    pub entity_key: String,
    pub total_exposure: f64,
    pub entity_count: i64,
    pub risk_level: String,
    pub last_updated: DateTime<Utc>,
}

impl From<ExposureRecord> for EntityExposure {
    /// An unrecognised `risk_level` reads as LOW; the engine rewrites the tier
    /// on its next evaluation.
    fn from(record: ExposureRecord) -> Self {
        let risk_level = record.risk_level.parse().unwrap_or_else(|e| {
            warn!("Exposure {}: {}, reading as LOW", record.entity_key, e);
            RiskLevel::Low
        });

        EntityExposure {
            key: record.entity_key,
            total_exposure: record.total_exposure,
            count: record.entity_count,
            risk_level,
            last_updated: record.last_updated,
        }
    }
}

/// Alert record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AlertRecord {
    pub alert_id: i64,
    pub timestamp: DateTime<Utc>,
    pub alert_type: String,
    pub severity: String,
    pub entity_type: String,
    pub entity_id: String,
    pub message: String,
    pub threshold_value: f64,
    pub current_value: f64,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
}

impl TryFrom<AlertRecord> for StoredAlert {
    type Error = StoreError;

    fn try_from(record: AlertRecord) -> Result<Self, Self::Error> {
        let decode = |e: String| StoreError::Decode(format!("alert {}: {}", record.alert_id, e));

        let alert = Alert {
            timestamp: record.timestamp,
            alert_type: record.alert_type.parse().map_err(decode)?,
            severity: record.severity.parse().map_err(decode)?,
            entity_type: record.entity_type.parse().map_err(decode)?,
            entity_id: record.entity_id,
            message: record.message,
            threshold_value: record.threshold_value,
            current_value: record.current_value,
            acknowledged: record.acknowledged,
        };

        Ok(StoredAlert {
            id: record.alert_id,
            alert,
            acknowledged_at: record.acknowledged_at,
            acknowledged_by: record.acknowledged_by,
        })
    }
}

/// Metrics snapshot record in database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MetricsRecord {
    pub metric_id: i64,
    pub timestamp: DateTime<Utc>,
    pub total_transactions: i64,
    pub total_exposure: f64,
    pub active_clients: i64,
    pub active_symbols: i64,
    pub high_risk_clients: i64,
    pub high_risk_symbols: i64,
    pub alerts_generated: i64,
}

impl From<MetricsRecord> for MetricsSnapshot {
    fn from(record: MetricsRecord) -> Self {
        MetricsSnapshot {
            timestamp: record.timestamp,
            total_transactions: record.total_transactions,
            total_exposure: record.total_exposure,
            active_clients: record.active_clients,
            active_symbols: record.active_symbols,
            high_risk_clients: record.high_risk_clients,
            high_risk_symbols: record.high_risk_symbols,
            alerts_generated: record.alerts_generated.max(0) as u64,
        }
    }
}
