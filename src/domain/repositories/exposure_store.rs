use async_trait::async_trait;

use super::StoreResult;
use crate::domain::entities::exposure::{EntityExposure, ExposureKind};
use crate::domain::value_objects::risk_level::RiskLevel;

/// Keyed exposure aggregates maintained by an external writer
#[async_trait]
pub trait ExposureStore: Send + Sync {
    /// Current totals for every client or every symbol
    async fn list_exposures(&self, kind: ExposureKind) -> StoreResult<Vec<EntityExposure>>;

    /// Write back the computed tier for one key
    async fn set_risk_level(
        &self,
        kind: ExposureKind,
        key: &str,
        level: RiskLevel,
    ) -> StoreResult<()>;

    async fn list_client_exposures(&self) -> StoreResult<Vec<EntityExposure>> {
        self.list_exposures(ExposureKind::Client).await
    }

    async fn list_symbol_exposures(&self) -> StoreResult<Vec<EntityExposure>> {
        self.list_exposures(ExposureKind::Symbol).await
    }
}
