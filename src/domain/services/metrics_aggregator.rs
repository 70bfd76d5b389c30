use chrono::Utc;

use super::exposure_classifier::classify;
use crate::domain::entities::exposure::EntityExposure;
use crate::domain::entities::metrics_snapshot::MetricsSnapshot;
use crate::domain::repositories::{ExposureStore, StoreResult, TransactionSource};

/// Builds point-in-time system summaries.
///
/// High-risk counts classify the current exposure totals against the
/// configured thresholds instead of trusting the stored `risk_level`, which
/// the engine leaves untouched for entities that triggered an alert.
#[derive(Debug, Clone)]
pub struct MetricsAggregator {
    client_threshold: f64,
    symbol_threshold: f64,
}

impl MetricsAggregator {
    pub fn new(client_threshold: f64, symbol_threshold: f64) -> Self {
        Self {
            client_threshold,
            symbol_threshold,
        }
    }

    /// Read the collaborators and summarize their current state
    pub async fn collect(
        &self,
        source: &dyn TransactionSource,
        store: &dyn ExposureStore,
        alerts_generated: u64,
    ) -> StoreResult<MetricsSnapshot> {
        let total_transactions = source.count().await?;
        let clients = store.list_client_exposures().await?;
        let symbols = store.list_symbol_exposures().await?;

        Ok(self.summarize(total_transactions, &clients, &symbols, alerts_generated))
    }

    pub fn summarize(
        &self,
        total_transactions: i64,
        clients: &[EntityExposure],
        symbols: &[EntityExposure],
        alerts_generated: u64,
    ) -> MetricsSnapshot {
        let valid = |e: &&EntityExposure| e.total_exposure.is_finite() && e.total_exposure >= 0.0;

        let total_exposure: f64 = clients.iter().filter(valid).map(|e| e.total_exposure).sum();
        let active_clients = clients.iter().filter(valid).filter(|e| e.is_active()).count();
        let active_symbols = symbols.iter().filter(valid).filter(|e| e.is_active()).count();
        let high_risk_clients = clients
            .iter()
            .filter(valid)
            .filter(|e| classify(e.total_exposure, self.client_threshold).tier.is_high_risk())
            .count();
        let high_risk_symbols = symbols
            .iter()
            .filter(valid)
            .filter(|e| classify(e.total_exposure, self.symbol_threshold).tier.is_high_risk())
            .count();

        MetricsSnapshot {
            timestamp: Utc::now(),
            total_transactions,
            total_exposure,
            active_clients: active_clients as i64,
            active_symbols: active_symbols as i64,
            high_risk_clients: high_risk_clients as i64,
            high_risk_symbols: high_risk_symbols as i64,
            alerts_generated,
        }
    }
}
