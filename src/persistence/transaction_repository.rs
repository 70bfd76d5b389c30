use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use tracing::{debug, error, warn};

use super::models::{NewTransaction, TransactionRecord};
use super::DbPool;
use crate::domain::entities::transaction::{FeedEntry, Transaction};
use crate::domain::errors::StoreError;
use crate::domain::repositories::{StoreResult, TransactionSource};

/// Decode one feed row, keeping only the id when the rest does not decode
fn decode_entry(row: &SqliteRow) -> StoreResult<FeedEntry> {
    let decoded = TransactionRecord::from_row(row)
        .map_err(StoreError::from)
        .and_then(Transaction::try_from);

    match decoded {
        Ok(transaction) => Ok(FeedEntry::Decoded(transaction)),
        Err(e) => {
            let id: i64 = row.try_get("transaction_id")?;
            warn!("Transaction row {} could not be decoded: {}", id, e);
            Ok(FeedEntry::Undecodable {
                id,
                reason: e.to_string(),
            })
        }
    }
}

/// Transaction feed backed by the `transactions` table
#[derive(Clone)]
pub struct SqliteTransactionSource {
    pool: DbPool,
}

impl SqliteTransactionSource {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Append a transaction and return its assigned id
    pub async fn insert(&self, transaction: &NewTransaction) -> StoreResult<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO transactions (
                timestamp, client_id, symbol, transaction_type,
                quantity, price, total_value, broker_id, market
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(transaction.timestamp)
        .bind(&transaction.client_id)
        .bind(&transaction.symbol)
        .bind(transaction.side.as_str())
        .bind(transaction.quantity)
        .bind(transaction.price)
        .bind(transaction.total_value())
        .bind(&transaction.broker_id)
        .bind(&transaction.market)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Failed to insert transaction for {}: {}",
                transaction.client_id, e
            );
            e
        })?
        .last_insert_rowid();

        debug!(
            "Inserted transaction {} for {} {}",
            id, transaction.client_id, transaction.symbol
        );
        Ok(id)
    }
}

#[async_trait]
impl TransactionSource for SqliteTransactionSource {
    async fn fetch_since(&self, cursor: i64, limit: usize) -> StoreResult<Vec<FeedEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query(
            r#"
            SELECT transaction_id, timestamp, client_id, symbol, transaction_type,
                   quantity, price, total_value, broker_id, market
            FROM transactions
            WHERE transaction_id > ?1
            ORDER BY transaction_id ASC
            LIMIT ?2
            "#,
        )
        .bind(cursor)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Failed to fetch transactions after {}: {}", cursor, e);
            e
        })?;

        rows.iter().map(decode_entry).collect()
    }

    async fn count(&self) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
