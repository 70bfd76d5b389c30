use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::application::services::risk_engine::{EngineStats, RiskEngine};

/// Message for the monitoring actor
pub enum MonitoringMessage {
    /// Run a cycle immediately, outside the schedule
    RunNow,
    /// Reply with the engine's current counters
    GetStats(oneshot::Sender<EngineStats>),
    /// Stop after the current cycle
    Shutdown,
}

/// Actor that drives the risk engine on a fixed interval.
///
/// Messages are only handled between cycles, so a shutdown never interrupts
/// a cycle in progress.
pub struct MonitoringActor {
    engine: RiskEngine,
    monitoring_interval: Duration,
}

impl MonitoringActor {
    pub fn new(engine: RiskEngine) -> Self {
        let monitoring_interval = engine.config().monitoring_interval;
        MonitoringActor {
            engine,
            monitoring_interval,
        }
    }

    /// Run the monitoring loop until shutdown; returns the engine's final counters
    pub async fn run(mut self, mut rx: mpsc::Receiver<MonitoringMessage>) -> EngineStats {
        info!(
            "Starting risk monitoring with interval {:?} from cursor {}",
            self.monitoring_interval,
            self.engine.cursor()
        );

        let mut ticker = interval(self.monitoring_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.perform_cycle().await;
                }

                msg = rx.recv() => {
                    match msg {
                        Some(MonitoringMessage::RunNow) => {
                            self.perform_cycle().await;
                        }
                        Some(MonitoringMessage::GetStats(reply)) => {
                            if reply.send(self.engine.stats()).is_err() {
                                warn!("Stats requester went away before reply");
                            }
                        }
                        Some(MonitoringMessage::Shutdown) => {
                            info!("Risk monitoring shutting down");
                            break;
                        }
                        None => {
                            error!("Monitoring actor message channel closed");
                            break;
                        }
                    }
                }
            }
        }

        let stats = self.engine.stats();
        info!(
            "Risk monitoring stopped after {} cycles at cursor {} ({} alerts generated)",
            stats.cycles_run, stats.cursor, stats.alerts_generated
        );
        stats
    }

    async fn perform_cycle(&mut self) {
        if let Err(e) = self.engine.run_cycle().await {
            error!("Monitoring cycle failed: {}", e);
        }
    }
}

/// Cloneable handle for talking to a running monitoring actor
#[derive(Clone)]
pub struct MonitoringHandle {
    tx: mpsc::Sender<MonitoringMessage>,
}

impl MonitoringHandle {
    pub async fn run_now(&self) -> bool {
        self.tx.send(MonitoringMessage::RunNow).await.is_ok()
    }

    /// Current engine counters, or `None` if the actor has stopped
    pub async fn stats(&self) -> Option<EngineStats> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(MonitoringMessage::GetStats(reply_tx))
            .await
            .ok()?;
        reply_rx.await.ok()
    }

    pub async fn shutdown(&self) {
        if self.tx.send(MonitoringMessage::Shutdown).await.is_err() {
            warn!("Monitoring actor already stopped");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the monitoring actor for an engine
pub fn spawn_monitoring_actor(engine: RiskEngine) -> (MonitoringHandle, JoinHandle<EngineStats>) {
    let (msg_tx, msg_rx) = mpsc::channel::<MonitoringMessage>(50);
    let actor = MonitoringActor::new(engine);

    let join = tokio::spawn(async move { actor.run(msg_rx).await });

    (MonitoringHandle { tx: msg_tx }, join)
}
