use async_trait::async_trait;

use super::StoreResult;
use crate::domain::entities::metrics_snapshot::MetricsSnapshot;

/// Append-only storage for metrics snapshots
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn record(&self, snapshot: &MetricsSnapshot) -> StoreResult<()>;
}
