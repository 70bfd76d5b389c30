use async_trait::async_trait;

use super::StoreResult;
use crate::domain::entities::alert::Alert;

/// Durable alert storage
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Store an alert and return the id assigned to it
    async fn create(&self, alert: &Alert) -> StoreResult<i64>;
}
