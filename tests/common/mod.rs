//! Collaborator doubles shared by the integration suites
#![allow(dead_code)]

use async_trait::async_trait;
use riskwatch::domain::entities::alert::{Alert, StoredAlert};
use riskwatch::domain::entities::exposure::{EntityExposure, ExposureKind};
use riskwatch::domain::entities::metrics_snapshot::MetricsSnapshot;
use riskwatch::domain::entities::transaction::FeedEntry;
use riskwatch::domain::errors::StoreError;
use riskwatch::domain::repositories::{
    AlertNotifier, AlertSink, ExposureStore, MetricsSink, StoreResult, TransactionSource,
};
use riskwatch::domain::value_objects::risk_level::RiskLevel;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::Mutex;

fn check_available(failing: &AtomicBool, store: &str) -> StoreResult<()> {
    if failing.load(Ordering::SeqCst) {
        Err(StoreError::Unavailable(format!("{} is offline", store)))
    } else {
        Ok(())
    }
}

#[derive(Default)]
pub struct MockTransactionFeed {
    entries: Mutex<Vec<FeedEntry>>,
}

impl MockTransactionFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, entry: impl Into<FeedEntry>) {
        let entry = entry.into();
        let mut entries = self.entries.lock().await;
        let pos = entries.partition_point(|e| e.id() <= entry.id());
        entries.insert(pos, entry);
    }
}

#[async_trait]
impl TransactionSource for MockTransactionFeed {
    async fn fetch_since(&self, cursor: i64, limit: usize) -> StoreResult<Vec<FeedEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|e| e.id() > cursor)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> StoreResult<i64> {
        Ok(self.entries.lock().await.len() as i64)
    }
}

#[derive(Default)]
pub struct MockExposureStore {
    clients: Mutex<BTreeMap<String, EntityExposure>>,
    symbols: Mutex<BTreeMap<String, EntityExposure>>,
    failing_list: AtomicBool,
    failing_write: AtomicBool,
}

impl MockExposureStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: ExposureKind) -> &Mutex<BTreeMap<String, EntityExposure>> {
        match kind {
            ExposureKind::Client => &self.clients,
            ExposureKind::Symbol => &self.symbols,
        }
    }

    pub async fn set_exposure(&self, kind: ExposureKind, key: &str, total: f64) {
        let mut table = self.table(kind).lock().await;
        let row = table
            .entry(key.to_string())
            .or_insert_with(|| EntityExposure::new(key, 0.0));
        row.total_exposure = total;
    }

    pub async fn get(&self, kind: ExposureKind, key: &str) -> Option<EntityExposure> {
        self.table(kind).lock().await.get(key).cloned()
    }

    pub fn set_failing_list(&self, failing: bool) {
        self.failing_list.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_write(&self, failing: bool) {
        self.failing_write.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExposureStore for MockExposureStore {
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
        match self.table(kind).lock().await.get_mut(key) {
            Some(row) => {
                row.risk_level = level;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{} exposure {}", kind, key))),
        }
    }
}

#[derive(Default)]
pub struct MockAlertSink {
    alerts: Mutex<Vec<StoredAlert>>,
    next_id: AtomicI64,
}

impl MockAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .await
            .iter()
            .map(|stored| stored.alert.clone())
            .collect()
    }
}

#[async_trait]
impl AlertSink for MockAlertSink {
    async fn create(&self, alert: &Alert) -> StoreResult<i64> {
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
pub struct MockMetricsSink {
    snapshots: Mutex<Vec<MetricsSnapshot>>,
}

impl MockMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshots(&self) -> Vec<MetricsSnapshot> {
        self.snapshots.lock().await.clone()
    }
}

#[async_trait]
impl MetricsSink for MockMetricsSink {
    async fn record(&self, snapshot: &MetricsSnapshot) -> StoreResult<()> {
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
