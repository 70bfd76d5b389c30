use async_trait::async_trait;

use super::StoreResult;
use crate::domain::entities::transaction::FeedEntry;

/// Append-only transaction feed read forward from a cursor
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Fetch entries with `id > cursor` in ascending id order.
    ///
    /// Never returns an id at or below `cursor`; at most `limit` rows are returned.
    /// A row that fails to decode comes back as [`FeedEntry::Undecodable`]
    /// instead of failing the batch.
    async fn fetch_since(&self, cursor: i64, limit: usize) -> StoreResult<Vec<FeedEntry>>;

    /// Total number of transactions in the feed
    async fn count(&self) -> StoreResult<i64>;
}
