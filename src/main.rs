use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use riskwatch::application::actors::spawn_monitoring_actor;
use riskwatch::application::handlers::status_handler::status_router;
use riskwatch::application::services::{EngineCollaborators, NotificationDispatcher, RiskEngine};
use riskwatch::config::{status_addr_from_env, NotificationConfig, RiskConfig};
use riskwatch::infrastructure::log_channel::LogChannel;
use riskwatch::infrastructure::slack_channel::SlackWebhookChannel;
use riskwatch::persistence::alert_repository::SqliteAlertRepository;
use riskwatch::persistence::exposure_repository::SqliteExposureStore;
use riskwatch::persistence::metrics_repository::SqliteMetricsRepository;
use riskwatch::persistence::transaction_repository::SqliteTransactionSource;
use riskwatch::persistence::{init_database, DatabaseConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riskwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Risk monitoring engine starting...");

    // Configuration errors are fatal: refuse to run with undefined thresholds
    let risk_config = RiskConfig::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    let notification_config = NotificationConfig::from_env()?;
    let status_addr = status_addr_from_env()?;
    let database_config = DatabaseConfig::from_env()?;

    info!(
        "Thresholds: client {:.2}, symbol {:.2}, velocity {} per {:?}, anomaly z {}",
        risk_config.client_exposure_threshold,
        risk_config.symbol_exposure_threshold,
        risk_config.velocity_threshold,
        risk_config.velocity_window,
        risk_config.anomaly_z_threshold
    );

    let pool = init_database(&database_config).await?;

    // Notification channels
    let mut dispatcher = NotificationDispatcher::new();
    if notification_config.log_alerts {
        dispatcher = dispatcher.with_channel(Arc::new(LogChannel::new()));
    }
    if let Some(url) = notification_config.slack_webhook_url.clone() {
        match SlackWebhookChannel::new(url) {
            Ok(channel) => dispatcher = dispatcher.with_channel(Arc::new(channel)),
            Err(e) => error!("Failed to set up Slack channel: {}", e),
        }
    }
    if dispatcher.is_empty() {
        warn!("No notification channels configured; alerts will only be stored");
    } else {
        info!("Notification channels: {}", dispatcher.channel_names().join(", "));
    }

    let collaborators = EngineCollaborators {
        transactions: Arc::new(SqliteTransactionSource::new(pool.clone())),
        exposures: Arc::new(SqliteExposureStore::new(pool.clone())),
        alerts: Arc::new(SqliteAlertRepository::new(pool.clone())),
        metrics: Arc::new(SqliteMetricsRepository::new(pool.clone())),
        notifier: Arc::new(dispatcher),
    };

    let engine = RiskEngine::new(risk_config, collaborators);
    let (monitor, monitor_task) = spawn_monitoring_actor(engine);

    let app = status_router(monitor.clone());

    info!("Status endpoints listening on {}", status_addr);
    let listener = tokio::net::TcpListener::bind(status_addr).await?;
    let server = axum::serve(listener, app);

    // Set up graceful shutdown
    let shutdown_signal = async move {
        let ctrl_c = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C signal"),
                Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                    info!("Received SIGTERM signal");
                }
                Err(e) => error!("Failed to install SIGTERM handler: {}", e),
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }
    };

    info!("Risk monitoring started. Press Ctrl+C to stop.");
    server.with_graceful_shutdown(shutdown_signal).await?;

    info!("Shutting down gracefully...");

    // The actor finishes any in-flight cycle before stopping
    monitor.shutdown().await;
    match monitor_task.await {
        Ok(stats) => info!(
            "Processed {} transactions in {} cycles, {} alerts generated, final cursor {}",
            stats.transactions_processed, stats.cycles_run, stats.alerts_generated, stats.cursor
        ),
        Err(e) => error!("Monitoring task ended abnormally: {}", e),
    }

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
