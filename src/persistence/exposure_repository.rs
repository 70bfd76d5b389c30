use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, Row};
use tracing::{debug, error, warn};

use super::models::ExposureRecord;
use super::DbPool;
use crate::domain::entities::exposure::{EntityExposure, ExposureKind};
use crate::domain::entities::transaction::Transaction;
use crate::domain::errors::StoreError;
use crate::domain::repositories::{ExposureStore, StoreResult};
use crate::domain::value_objects::risk_level::RiskLevel;

const SELECT_CLIENT_EXPOSURES: &str = r#"
    SELECT client_id AS entity_key, total_exposure, position_count AS entity_count,
           risk_level, last_updated
    FROM client_exposures
    ORDER BY client_id
"#;

const SELECT_SYMBOL_EXPOSURES: &str = r#"
    SELECT symbol AS entity_key, total_exposure, transaction_count AS entity_count,
           risk_level, last_updated
    FROM symbol_exposures
    ORDER BY symbol
"#;

/// Client and symbol aggregates backed by the exposure tables
#[derive(Clone)]
pub struct SqliteExposureStore {
    pool: DbPool,
}

impl SqliteExposureStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Add a transaction's value to its client and symbol aggregates,
    /// creating either row on first use
    pub async fn apply_transaction(&self, transaction: &Transaction) -> StoreResult<()> {
        let mut db_tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO client_exposures (client_id, total_exposure, position_count, last_updated)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(client_id) DO UPDATE SET
                total_exposure = client_exposures.total_exposure + excluded.total_exposure,
                position_count = client_exposures.position_count + 1,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&transaction.client_id)
        .bind(transaction.total_value)
        .bind(transaction.timestamp)
        .execute(&mut *db_tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO symbol_exposures (symbol, total_exposure, transaction_count, last_updated)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(symbol) DO UPDATE SET
                total_exposure = symbol_exposures.total_exposure + excluded.total_exposure,
                transaction_count = symbol_exposures.transaction_count + 1,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&transaction.symbol)
        .bind(transaction.total_value)
        .bind(transaction.timestamp)
        .execute(&mut *db_tx)
        .await?;

        db_tx.commit().await.map_err(|e| {
            error!(
                "Failed to apply transaction {} to exposures: {}",
                transaction.id, e
            );
            StoreError::from(e)
        })?;

        Ok(())
    }

    /// Overwrite one exposure total, creating the row if needed
    pub async fn set_exposure(&self, kind: ExposureKind, key: &str, total: f64) -> StoreResult<()> {
        let sql = match kind {
            ExposureKind::Client => {
                r#"
                INSERT INTO client_exposures (client_id, total_exposure, last_updated)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(client_id) DO UPDATE SET
                    total_exposure = excluded.total_exposure,
                    last_updated = excluded.last_updated
                "#
            }
            ExposureKind::Symbol => {
                r#"
                INSERT INTO symbol_exposures (symbol, total_exposure, last_updated)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(symbol) DO UPDATE SET
                    total_exposure = excluded.total_exposure,
                    last_updated = excluded.last_updated
                "#
            }
        };

        sqlx::query(sql)
            .bind(key)
            .bind(total)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ExposureStore for SqliteExposureStore {
    async fn list_exposures(&self, kind: ExposureKind) -> StoreResult<Vec<EntityExposure>> {
        let sql = match kind {
            ExposureKind::Client => SELECT_CLIENT_EXPOSURES,
            ExposureKind::Symbol => SELECT_SYMBOL_EXPOSURES,
        };

        let rows = sqlx::query(sql).fetch_all(&self.pool).await.map_err(|e| {
            error!("Failed to list {} exposures: {}", kind, e);
            e
        })?;

        // A row that does not decode is skipped so the rest are still evaluated
        let mut exposures = Vec::with_capacity(rows.len());
        for row in &rows {
            match ExposureRecord::from_row(row) {
                Ok(record) => exposures.push(EntityExposure::from(record)),
                Err(e) => {
                    let key: String = row
                        .try_get("entity_key")
                        .unwrap_or_else(|_| "<unknown>".to_string());
                    warn!("Skipping {} exposure {}: {}", kind, key, e);
                }
            }
        }
        Ok(exposures)
    }

    async fn set_risk_level(
        &self,
        kind: ExposureKind,
        key: &str,
        level: RiskLevel,
    ) -> StoreResult<()> {
        let sql = match kind {
            ExposureKind::Client => "UPDATE client_exposures SET risk_level = ?1 WHERE client_id = ?2",
            ExposureKind::Symbol => "UPDATE symbol_exposures SET risk_level = ?1 WHERE symbol = ?2",
        };

        let rows_affected = sqlx::query(sql)
            .bind(level.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("{} exposure {}", kind, key)));
        }

        debug!("Set {} {} risk level to {}", kind, key, level);
        Ok(())
    }
}
