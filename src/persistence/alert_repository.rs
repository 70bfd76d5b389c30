//! Alert storage and administration
//!
//! The engine only creates alerts. Acknowledgment, summaries, listing and
//! purging are operator operations on the same table.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use super::models::AlertRecord;
use super::DbPool;
use crate::domain::entities::alert::{Alert, EntityType, StoredAlert};
use crate::domain::repositories::{AlertSink, StoreResult};
use crate::domain::value_objects::risk_level::Severity;

/// Filter for listing alerts; unset fields match everything
#[derive(Debug, Clone)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub entity_type: Option<EntityType>,
    pub acknowledged: Option<bool>,
    pub limit: u32,
}

impl Default for AlertFilter {
    fn default() -> Self {
        Self {
            severity: None,
            entity_type: None,
            acknowledged: None,
            limit: 100,
        }
    }
}

/// Counts over the alerts table; breakdowns cover unacknowledged alerts only
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total: i64,
    pub unacknowledged: i64,
    pub by_severity: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
}

#[derive(Clone)]
pub struct SqliteAlertRepository {
    pool: DbPool,
}

impl SqliteAlertRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: i64) -> StoreResult<Option<StoredAlert>> {
        let record = sqlx::query_as::<_, AlertRecord>("SELECT * FROM alerts WHERE alert_id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(StoredAlert::try_from).transpose()
    }

    /// Most recent alerts first
    pub async fn list(&self, filter: &AlertFilter) -> StoreResult<Vec<StoredAlert>> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM alerts WHERE 1=1");

        if let Some(severity) = filter.severity {
            query.push(" AND severity = ").push_bind(severity.as_str());
        }
        if let Some(entity_type) = filter.entity_type {
            query.push(" AND entity_type = ").push_bind(entity_type.as_str());
        }
        if let Some(acknowledged) = filter.acknowledged {
            query.push(" AND acknowledged = ").push_bind(acknowledged);
        }
        query
            .push(" ORDER BY timestamp DESC, alert_id DESC LIMIT ")
            .push_bind(i64::from(filter.limit));

        let records = query
            .build_query_as::<AlertRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Failed to list alerts: {}", e);
                e
            })?;

        records.into_iter().map(StoredAlert::try_from).collect()
    }

    /// Mark one alert acknowledged; returns false if it does not exist or
    /// was already acknowledged
    pub async fn acknowledge(&self, id: i64, acknowledged_by: &str) -> StoreResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE alerts
            SET acknowledged = 1, acknowledged_at = ?1, acknowledged_by = ?2
            WHERE alert_id = ?3 AND acknowledged = 0
            "#,
        )
        .bind(Utc::now())
        .bind(acknowledged_by)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected > 0 {
            info!("Alert {} acknowledged by {}", id, acknowledged_by);
        }
        Ok(rows_affected > 0)
    }

    /// Acknowledge several alerts; returns how many changed
    pub async fn acknowledge_many(&self, ids: &[i64], acknowledged_by: &str) -> StoreResult<u64> {
        let mut acknowledged = 0;
        for id in ids {
            if self.acknowledge(*id, acknowledged_by).await? {
                acknowledged += 1;
            }
        }
        Ok(acknowledged)
    }

    pub async fn summary(&self) -> StoreResult<AlertSummary> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM alerts")
            .fetch_one(&self.pool)
            .await?;
        let (unacknowledged,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM alerts WHERE acknowledged = 0")
                .fetch_one(&self.pool)
                .await?;

        let by_severity: Vec<(String, i64)> = sqlx::query_as(
            "SELECT severity, COUNT(*) FROM alerts WHERE acknowledged = 0 GROUP BY severity",
        )
        .fetch_all(&self.pool)
        .await?;
        let by_type: Vec<(String, i64)> = sqlx::query_as(
            "SELECT alert_type, COUNT(*) FROM alerts WHERE acknowledged = 0 GROUP BY alert_type",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(AlertSummary {
            total,
            unacknowledged,
            by_severity: by_severity.into_iter().collect(),
            by_type: by_type.into_iter().collect(),
        })
    }

    /// Delete acknowledged alerts older than `days`; returns rows removed
    pub async fn purge_acknowledged(&self, days: u32) -> StoreResult<u64> {
        let cutoff = Utc::now() - Duration::days(i64::from(days));

        let removed = sqlx::query("DELETE FROM alerts WHERE acknowledged = 1 AND timestamp < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        info!("Purged {} acknowledged alerts older than {} days", removed, days);
        Ok(removed)
    }
}

#[async_trait]
impl AlertSink for SqliteAlertRepository {
    async fn create(&self, alert: &Alert) -> StoreResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO alerts (
                timestamp, alert_type, severity, entity_type, entity_id,
                message, threshold_value, current_value, acknowledged
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(alert.timestamp)
        .bind(alert.alert_type.as_str())
        .bind(alert.severity.as_str())
        .bind(alert.entity_type.as_str())
        .bind(&alert.entity_id)
        .bind(&alert.message)
        .bind(alert.threshold_value)
        .bind(alert.current_value)
        .bind(alert.acknowledged)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to create {} alert for {}: {}",
                alert.alert_type, alert.entity_id, e
            );
            e
        })?
        .last_insert_rowid();

        debug!("Created alert {}: {}", id, alert.message);
        Ok(id)
    }
}
