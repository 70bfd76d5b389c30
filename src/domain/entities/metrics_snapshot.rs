use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time system summary, appended every N engine cycles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_transactions: i64,
    /// Sum of all client exposures
    pub total_exposure: f64,
    pub active_clients: i64,
    pub active_symbols: i64,
    pub high_risk_clients: i64,
    pub high_risk_symbols: i64,
    /// Engine's cumulative alert counter at snapshot time
    pub alerts_generated: u64,
}
