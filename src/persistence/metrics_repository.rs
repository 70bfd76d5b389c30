use async_trait::async_trait;
use tracing::{debug, error};

use super::models::MetricsRecord;
use super::DbPool;
use crate::domain::entities::metrics_snapshot::MetricsSnapshot;
use crate::domain::repositories::{MetricsSink, StoreResult};

/// Append-only snapshots in the `risk_metrics` table
#[derive(Clone)]
pub struct SqliteMetricsRepository {
    pool: DbPool,
}

impl SqliteMetricsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Most recent snapshots first
    pub async fn recent(&self, limit: u32) -> StoreResult<Vec<MetricsSnapshot>> {
        let records = sqlx::query_as::<_, MetricsRecord>(
            "SELECT * FROM risk_metrics ORDER BY timestamp DESC, metric_id DESC LIMIT ?1",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(MetricsSnapshot::from).collect())
    }
}

#[async_trait]
impl MetricsSink for SqliteMetricsRepository {
    async fn record(&self, snapshot: &MetricsSnapshot) -> StoreResult<()> {
        let alerts_generated = i64::try_from(snapshot.alerts_generated).unwrap_or(i64::MAX);

        sqlx::query(
            r#"
            INSERT INTO risk_metrics (
                timestamp, total_transactions, total_exposure, active_clients,
                active_symbols, high_risk_clients, high_risk_symbols, alerts_generated
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(snapshot.timestamp)
        .bind(snapshot.total_transactions)
        .bind(snapshot.total_exposure)
        .bind(snapshot.active_clients)
        .bind(snapshot.active_symbols)
        .bind(snapshot.high_risk_clients)
        .bind(snapshot.high_risk_symbols)
        .bind(alerts_generated)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to record metrics snapshot: {}", e);
            e
        })?;

        debug!("Recorded metrics snapshot at {}", snapshot.timestamp);
        Ok(())
    }
}
