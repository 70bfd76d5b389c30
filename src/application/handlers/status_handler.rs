use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::application::actors::monitoring_actor::MonitoringHandle;
use crate::application::services::risk_engine::EngineStats;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub monitoring: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Read-only status routes backed by the monitoring actor
pub fn status_router(handle: MonitoringHandle) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(handle)
}

pub async fn health(State(handle): State<MonitoringHandle>) -> Json<HealthResponse> {
    let monitoring = !handle.is_closed();
    Json(HealthResponse {
        status: if monitoring { "ok" } else { "degraded" }.to_string(),
        monitoring,
    })
}

pub async fn stats(
    State(handle): State<MonitoringHandle>,
) -> Result<Json<EngineStats>, (StatusCode, Json<ErrorResponse>)> {
    match handle.stats().await {
        Some(stats) => Ok(Json(stats)),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Risk monitoring is not running".to_string(),
            }),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::actors::monitoring_actor::spawn_monitoring_actor;
    use crate::application::services::risk_engine::{EngineCollaborators, RiskEngine};
    use crate::config::RiskConfig;
    use crate::infrastructure::in_memory::{
        InMemoryAlertSink, InMemoryExposureStore, InMemoryMetricsSink,
        InMemoryTransactionSource, RecordingNotifier,
    };
    use std::sync::Arc;
    use std::time::Duration;

    fn engine() -> RiskEngine {
        RiskEngine::new(
            RiskConfig {
                monitoring_interval: Duration::from_secs(10),
                ..RiskConfig::default()
            },
            EngineCollaborators {
                transactions: Arc::new(InMemoryTransactionSource::new()),
                exposures: Arc::new(InMemoryExposureStore::new()),
                alerts: Arc::new(InMemoryAlertSink::new()),
                metrics: Arc::new(InMemoryMetricsSink::new()),
                notifier: Arc::new(RecordingNotifier::new()),
            },
        )
    }

    #[tokio::test]
    async fn test_health_and_stats_while_running() {
        let (handle, join) = spawn_monitoring_actor(engine().with_cursor(17));

        let Json(health_body) = health(State(handle.clone())).await;
        assert_eq!(health_body.status, "ok");
        assert!(health_body.monitoring);

        let Json(stats_body) = stats(State(handle.clone())).await.unwrap();
        assert_eq!(stats_body.cursor, 17);

        handle.shutdown().await;
        join.await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_unavailable_after_shutdown() {
        let (handle, join) = spawn_monitoring_actor(engine());
        handle.shutdown().await;
        join.await.unwrap();

        let Json(health_body) = health(State(handle.clone())).await;
        assert_eq!(health_body.status, "degraded");

        let (status, Json(body)) = stats(State(handle)).await.unwrap_err();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.error.contains("not running"));
    }
}
