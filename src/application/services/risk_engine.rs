//! Risk engine orchestrator
//!
//! Owns the polling cursor, the rolling-window trackers and the anomaly
//! baseline. One call to [`RiskEngine::run_cycle`] is one poll-process-alert
//! pass; scheduling lives in the monitoring actor.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::RiskConfig;
use crate::domain::entities::alert::{Alert, EntityType};
use crate::domain::entities::exposure::ExposureKind;
use crate::domain::entities::transaction::{FeedEntry, Transaction};
use crate::domain::errors::EngineError;
use crate::domain::repositories::{
    AlertNotifier, AlertSink, ExposureStore, MetricsSink, TransactionSource,
};
use crate::domain::services::alert_factory::AlertFactory;
use crate::domain::services::alert_suppressor::AlertSuppressor;
use crate::domain::services::anomaly_detector::AnomalyDetector;
use crate::domain::services::event_rate_tracker::EventRateTracker;
use crate::domain::services::exposure_classifier::classify;
use crate::domain::services::metrics_aggregator::MetricsAggregator;

/// External collaborators the engine reads from and writes to
#[derive(Clone)]
pub struct EngineCollaborators {
    pub transactions: Arc<dyn TransactionSource>,
    pub exposures: Arc<dyn ExposureStore>,
    pub alerts: Arc<dyn AlertSink>,
    pub metrics: Arc<dyn MetricsSink>,
    pub notifier: Arc<dyn AlertNotifier>,
}

/// Cumulative engine counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStats {
    /// Last fully processed transaction id
    pub cursor: i64,
    pub cycles_run: u64,
    pub cycles_failed: u64,
    pub transactions_processed: u64,
    /// Transactions that failed validation; the cursor still moves past them
    pub transactions_skipped: u64,
    /// Alerts stored by the sink
    pub alerts_generated: u64,
    /// Alerts the sink failed to store
    pub alerts_failed: u64,
    pub alerts_suppressed: u64,
}

/// Outcome of a single cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub transactions_processed: usize,
    pub transactions_skipped: usize,
    pub exposures_evaluated: usize,
    /// Alerts that passed suppression, whether or not the sink stored them
    pub alerts_emitted: usize,
    pub metrics_recorded: bool,
}

/// Mutable state threaded through every cycle step
struct EngineState {
    stats: EngineStats,
    client_velocity: EventRateTracker,
    symbol_velocity: EventRateTracker,
    anomaly: AnomalyDetector,
    suppressor: AlertSuppressor,
}

pub struct RiskEngine {
    config: RiskConfig,
    collaborators: EngineCollaborators,
    aggregator: MetricsAggregator,
    velocity_window: chrono::Duration,
    state: EngineState,
}

impl RiskEngine {
    /// Build an engine starting from cursor 0.
    ///
    /// `config` must already be validated.
    pub fn new(config: RiskConfig, collaborators: EngineCollaborators) -> Self {
        let velocity_window = chrono::Duration::from_std(config.velocity_window)
            .unwrap_or_else(|_| chrono::Duration::weeks(5200));

        let state = EngineState {
            stats: EngineStats::default(),
            client_velocity: EventRateTracker::new(config.velocity_capacity),
            symbol_velocity: EventRateTracker::new(config.velocity_capacity),
            anomaly: AnomalyDetector::new(config.anomaly_config()),
            suppressor: AlertSuppressor::new(config.alert_cooldown),
        };

        Self {
            aggregator: MetricsAggregator::new(
                config.client_exposure_threshold,
                config.symbol_exposure_threshold,
            ),
            velocity_window,
            config,
            collaborators,
            state,
        }
    }

    /// Resume from an externally supplied cursor
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.state.stats.cursor = cursor;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.state.stats.cursor
    }

    pub fn stats(&self) -> EngineStats {
        self.state.stats.clone()
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Run one poll-process-alert pass.
    ///
    /// Per-transaction and per-entity failures are logged and skipped. Only a
    /// failed batch fetch or exposure listing aborts the remaining steps, and
    /// the cursor keeps whatever progress was made before the abort.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, EngineError> {
        self.state.stats.cycles_run += 1;
        let mut report = CycleReport {
            cycle: self.state.stats.cycles_run,
            ..CycleReport::default()
        };

        if let Err(e) = self.execute_cycle(&mut report).await {
            self.state.stats.cycles_failed += 1;
            return Err(e);
        }

        debug!(
            "Cycle {} done: {} transactions, {} exposures, {} alerts, cursor {}",
            report.cycle,
            report.transactions_processed,
            report.exposures_evaluated,
            report.alerts_emitted,
            self.state.stats.cursor
        );

        Ok(report)
    }

    async fn execute_cycle(&mut self, report: &mut CycleReport) -> Result<(), EngineError> {
        self.process_new_transactions(report).await?;

        self.evaluate_exposures(
            ExposureKind::Client,
            self.config.client_exposure_threshold,
            report,
        )
        .await?;
        self.evaluate_exposures(
            ExposureKind::Symbol,
            self.config.symbol_exposure_threshold,
            report,
        )
        .await?;

        if report.cycle % self.config.metrics_every_n_cycles == 0 {
            report.metrics_recorded = self.record_metrics().await;
        }

        Ok(())
    }

    async fn process_new_transactions(
        &mut self,
        report: &mut CycleReport,
    ) -> Result<(), EngineError> {
        let cursor = self.state.stats.cursor;
        let batch = self
            .collaborators
            .transactions
            .fetch_since(cursor, self.config.max_batch_size)
            .await
            .map_err(|source| EngineError::FetchTransactions { cursor, source })?;

        if batch.len() == self.config.max_batch_size {
            debug!(
                "Batch capped at {} transactions, remainder deferred to next cycle",
                self.config.max_batch_size
            );
        }

        for entry in batch {
            let id = entry.id();
            if id <= self.state.stats.cursor {
                warn!(
                    "Ignoring transaction {} at or below cursor {}",
                    id, self.state.stats.cursor
                );
                continue;
            }

            let checked = match entry {
                FeedEntry::Decoded(transaction) => transaction
                    .validate()
                    .map(|()| transaction)
                    .map_err(|e| e.to_string()),
                FeedEntry::Undecodable { reason, .. } => Err(reason),
            };

            match checked {
                Ok(transaction) => {
                    self.process_transaction(&transaction, report).await;
                    self.state.stats.transactions_processed += 1;
                    report.transactions_processed += 1;
                }
                Err(reason) => {
                    warn!("Skipping checks for transaction {}: {}", id, reason);
                    self.state.stats.transactions_skipped += 1;
                    report.transactions_skipped += 1;
                }
            }

            self.state.stats.cursor = id;
        }

        Ok(())
    }

    async fn process_transaction(&mut self, transaction: &Transaction, report: &mut CycleReport) {
        self.state
            .client_velocity
            .record(&transaction.client_id, transaction.timestamp);
        self.state
            .symbol_velocity
            .record(&transaction.symbol, transaction.timestamp);

        if let Some(finding) = self.state.anomaly.evaluate(transaction.total_value) {
            debug!(
                "Transaction {} value {} flagged with z-score {:.2}",
                transaction.id, finding.value, finding.z_score
            );
            self.emit(AlertFactory::anomaly_alert(&finding), report).await;
        }

        let cutoff = Utc::now() - self.velocity_window;
        let threshold = self.config.velocity_threshold;

        let client_count = self
            .state
            .client_velocity
            .count_since(&transaction.client_id, cutoff);
        if client_count > threshold as usize {
            let alert = AlertFactory::velocity_alert(
                EntityType::Client,
                &transaction.client_id,
                client_count,
                threshold,
                self.config.velocity_window,
            );
            self.emit(alert, report).await;
        }

        let symbol_count = self
            .state
            .symbol_velocity
            .count_since(&transaction.symbol, cutoff);
        if symbol_count > threshold as usize {
            let alert = AlertFactory::velocity_alert(
                EntityType::Symbol,
                &transaction.symbol,
                symbol_count,
                threshold,
                self.config.velocity_window,
            );
            self.emit(alert, report).await;
        }
    }

    async fn evaluate_exposures(
        &mut self,
        kind: ExposureKind,
        threshold: f64,
        report: &mut CycleReport,
    ) -> Result<(), EngineError> {
        let exposures = self
            .collaborators
            .exposures
            .list_exposures(kind)
            .await
            .map_err(|source| EngineError::ListExposures {
                kind: kind.to_string(),
                source,
            })?;

        for exposure in exposures {
            if let Err(e) = exposure.validate() {
                warn!("Skipping {} exposure {}: {}", kind, exposure.key, e);
                continue;
            }

            let assessment = classify(exposure.total_exposure, threshold);
            report.exposures_evaluated += 1;

            if assessment.triggered {
                let alert = AlertFactory::exposure_alert(
                    kind,
                    &exposure.key,
                    exposure.total_exposure,
                    threshold,
                    assessment,
                );
                self.emit(alert, report).await;
            } else if let Err(e) = self
                .collaborators
                .exposures
                .set_risk_level(kind, &exposure.key, assessment.tier)
                .await
            {
                warn!(
                    "Failed to update risk level for {} {} to {}: {}",
                    kind, exposure.key, assessment.tier, e
                );
            }
        }

        Ok(())
    }

    /// Suppression check, then sink, then notifier. The notifier runs
    /// whether or not the sink stored the alert.
    async fn emit(&mut self, alert: Alert, report: &mut CycleReport) {
        if !self.state.suppressor.admit(&alert) {
            self.state.stats.alerts_suppressed += 1;
            debug!(
                "Suppressed {} alert for {} {} within cooldown",
                alert.alert_type, alert.entity_type, alert.entity_id
            );
            return;
        }

        match self.collaborators.alerts.create(&alert).await {
            Ok(id) => {
                self.state.stats.alerts_generated += 1;
                debug!(
                    "Stored alert {}: {} {} {}",
                    id, alert.alert_type, alert.entity_type, alert.entity_id
                );
            }
            Err(e) => {
                self.state.stats.alerts_failed += 1;
                error!(
                    "Failed to store {} alert for {} {}: {}",
                    alert.alert_type, alert.entity_type, alert.entity_id, e
                );
            }
        }

        self.collaborators.notifier.send(&alert).await;
        report.alerts_emitted += 1;
    }

    /// Snapshot and persist system metrics; returns whether the row was written
    async fn record_metrics(&self) -> bool {
        let snapshot = match self
            .aggregator
            .collect(
                self.collaborators.transactions.as_ref(),
                self.collaborators.exposures.as_ref(),
                self.state.stats.alerts_generated,
            )
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Failed to collect metrics: {}", e);
                return false;
            }
        };

        info!(
            "Cycle {}: {} transactions, total exposure {:.2}, {} active clients, {} active symbols, {} high-risk clients, {} high-risk symbols, {} alerts generated",
            self.state.stats.cycles_run,
            snapshot.total_transactions,
            snapshot.total_exposure,
            snapshot.active_clients,
            snapshot.active_symbols,
            snapshot.high_risk_clients,
            snapshot.high_risk_symbols,
            snapshot.alerts_generated
        );

        match self.collaborators.metrics.record(&snapshot).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to record metrics snapshot: {}", e);
                false
            }
        }
    }
}
