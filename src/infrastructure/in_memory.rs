//! In-memory collaborators
//!
//! Process-local implementations of the collaborator traits for unit tests.
//! Each store can be switched into a failing mode to exercise the engine's
//! failure policy.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::Mutex;

use crate::domain::entities::alert::{Alert, StoredAlert};
use crate::domain::entities::exposure::{EntityExposure, ExposureKind};
use crate::domain::entities::metrics_snapshot::MetricsSnapshot;
use crate::domain::entities::transaction::{FeedEntry, Transaction};
use crate::domain::errors::StoreError;
use crate::domain::repositories::{
    AlertNotifier, AlertSink, ExposureStore, MetricsSink, StoreResult, TransactionSource,
};
use crate::domain::value_objects::risk_level::RiskLevel;

fn check_available(failing: &AtomicBool, store: &str) -> StoreResult<()> {
    if failing.load(Ordering::SeqCst) {
        Err(StoreError::Unavailable(format!("{} is offline", store)))
    } else {
        Ok(())
    }
}

/// Append-only transaction feed kept in id order
#[derive(Default)]
pub struct InMemoryTransactionSource {
    entries: Mutex<Vec<FeedEntry>>,
    failing: AtomicBool,
}

impl InMemoryTransactionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, keeping the feed sorted by id
    pub async fn push(&self, entry: impl Into<FeedEntry>) {
        let entry = entry.into();
        let mut entries = self.entries.lock().await;
        let pos = entries.partition_point(|e| e.id() <= entry.id());
        entries.insert(pos, entry);
    }

    /// Append a row that cannot be decoded
    pub async fn push_undecodable(&self, id: i64, reason: &str) {
        self.push(FeedEntry::Undecodable {
            id,
            reason: reason.to_string(),
        })
        .await;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl TransactionSource for InMemoryTransactionSource {
    async fn fetch_since(&self, cursor: i64, limit: usize) -> StoreResult<Vec<FeedEntry>> {
        check_available(&self.failing, "transaction source")?;
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.id() > cursor)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        check_available(&self.failing, "transaction source")?;
        Ok(self.entries.lock().await.len() as i64)
    }
}

/// Client and symbol exposure aggregates
#[derive(Default)]
pub struct InMemoryExposureStore {
    clients: Mutex<BTreeMap<String, EntityExposure>>,
    symbols: Mutex<BTreeMap<String, EntityExposure>>,
    failing_list: AtomicBool,
    failing_write: AtomicBool,
}

impl InMemoryExposureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: ExposureKind) -> &Mutex<BTreeMap<String, EntityExposure>> {
        match kind {
            ExposureKind::Client => &self.clients,
            ExposureKind::Symbol => &self.symbols,
        }
    }

    /// Overwrite the total for one key, creating the row if needed
    pub async fn set_exposure(&self, kind: ExposureKind, key: &str, total: f64) {
        let mut table = self.table(kind).lock().await;
        let row = table
            .entry(key.to_string())
            .or_insert_with(|| EntityExposure::new(key, 0.0));
        row.total_exposure = total;
        row.last_updated = chrono::Utc::now();
    }

    /// Add a transaction's value to its client and symbol aggregates
    pub async fn apply_transaction(&self, transaction: &Transaction) {
        for (kind, key) in [
            (ExposureKind::Client, &transaction.client_id),
            (ExposureKind::Symbol, &transaction.symbol),
        ] {
            let mut table = self.table(kind).lock().await;
            let row = table
                .entry(key.clone())
                .or_insert_with(|| EntityExposure::new(key.as_str(), 0.0));
            row.total_exposure += transaction.total_value;
            row.count += 1;
            row.last_updated = transaction.timestamp;
        }
    }

    pub async fn get(&self, kind: ExposureKind, key: &str) -> Option<EntityExposure> {
        self.table(kind).lock().await.get(key).cloned()
    }

    /// Make `list_exposures` fail
    pub fn set_failing_list(&self, failing: bool) {
        self.failing_list.store(failing, Ordering::SeqCst);
    }

    /// Make `set_risk_level` fail
    pub fn set_failing_write(&self, failing: bool) {
        self.failing_write.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExposureStore for InMemoryExposureStore {
    async fn list_exposures(&self, kind: ExposureKind) -> StoreResult<Vec<EntityExposure>> {
        check_available(&self.failing_list, "exposure store")?;
        Ok(self.table(kind).lock().await.values().cloned().collect())
    }

    async fn set_risk_level(
        &self,
        kind: ExposureKind,
        key: &str,
        level: RiskLevel,
    ) -> StoreResult<()> {
        check_available(&self.failing_write, "exposure store")?;
        let mut table = self.table(kind).lock().await;
        match table.get_mut(key) {
            Some(row) => {
                row.risk_level = level;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{} exposure {}", kind, key))),
        }
    }
}

/// Alert storage assigning sequential ids from 1
#[derive(Default)]
pub struct InMemoryAlertSink {
    alerts: Mutex<Vec<StoredAlert>>,
    next_id: AtomicI64,
    failing: AtomicBool,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .await
            .iter()
            .map(|stored| stored.alert.clone())
            .collect()
    }

    pub async fn stored(&self) -> Vec<StoredAlert> {
        self.alerts.lock().await.clone()
    }
}

#[async_trait]
impl AlertSink for InMemoryAlertSink {
    async fn create(&self, alert: &Alert) -> StoreResult<i64> {
        check_available(&self.failing, "alert sink")?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.alerts.lock().await.push(StoredAlert {
            id,
            alert: alert.clone(),
            acknowledged_at: None,
            acknowledged_by: None,
        });
        Ok(id)
    }
}

#[derive(Default)]
pub struct InMemoryMetricsSink {
    snapshots: Mutex<Vec<MetricsSnapshot>>,
    failing: AtomicBool,
}

impl InMemoryMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn snapshots(&self) -> Vec<MetricsSnapshot> {
        self.snapshots.lock().await.clone()
    }
}

#[async_trait]
impl MetricsSink for InMemoryMetricsSink {
    async fn record(&self, snapshot: &MetricsSnapshot) -> StoreResult<()> {
        check_available(&self.failing, "metrics sink")?;
        self.snapshots.lock().await.push(snapshot.clone());
        Ok(())
    }
}

/// Notifier that keeps every alert it is handed
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Alert>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Alert> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn send(&self, alert: &Alert) {
        self.sent.lock().await.push(alert.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::transaction::TransactionSide;
    use chrono::Utc;

    fn transaction(id: i64, value: f64) -> Transaction {
        Transaction {
            id,
            client_id: "CLIENT_001".to_string(),
            symbol: "AAPL".to_string(),
            side: TransactionSide::Sell,
            quantity: 1,
            price: value,
            total_value: value,
            broker_id: "BROKER_A".to_string(),
            market: "NASDAQ".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_fetch_since_is_ordered_and_bounded() {
        let source = InMemoryTransactionSource::new();
        for id in [3, 1, 2, 5, 4] {
            source.push(transaction(id, 10.0)).await;
        }

        let ids: Vec<i64> = source
            .fetch_since(1, 3)
            .await
            .unwrap()
            .iter()
            .map(FeedEntry::id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert_eq!(source.count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_apply_transaction_accumulates_both_sides() {
        let store = InMemoryExposureStore::new();
        store.apply_transaction(&transaction(1, 100.0)).await;
        store.apply_transaction(&transaction(2, 50.0)).await;

        let client = store.get(ExposureKind::Client, "CLIENT_001").await.unwrap();
        assert_eq!(client.total_exposure, 150.0);
        assert_eq!(client.count, 2);
        let symbol = store.get(ExposureKind::Symbol, "AAPL").await.unwrap();
        assert_eq!(symbol.total_exposure, 150.0);
    }

    #[tokio::test]
    async fn test_set_risk_level_unknown_key_is_not_found() {
        let store = InMemoryExposureStore::new();
        let result = store
            .set_risk_level(ExposureKind::Client, "NOBODY", RiskLevel::High)
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_alert_sink_assigns_sequential_ids() {
        let sink = InMemoryAlertSink::new();
        let alert = crate::domain::services::alert_factory::AlertFactory::velocity_alert(
            crate::domain::entities::alert::EntityType::Client,
            "CLIENT_001",
            11,
            10,
            std::time::Duration::from_secs(60),
        );
        assert_eq!(sink.create(&alert).await.unwrap(), 1);
        assert_eq!(sink.create(&alert).await.unwrap(), 2);

        sink.set_failing(true);
        assert!(sink.create(&alert).await.is_err());
        assert_eq!(sink.stored().await.len(), 2);
    }
}
