use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::domain::services::anomaly_detector::AnomalyConfig;

/// Configuration errors are fatal at startup
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse {name}='{value}': {reason}")]
    Parse {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Risk engine thresholds and scheduling
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub client_exposure_threshold: f64,
    pub symbol_exposure_threshold: f64,
    /// Transactions per velocity window above which an entity is alerted
    pub velocity_threshold: u32,
    pub velocity_window: Duration,
    /// Timestamps kept per client/symbol; must exceed the velocity threshold
    pub velocity_capacity: usize,
    pub anomaly_z_threshold: f64,
    pub anomaly_high_severity_z: f64,
    pub anomaly_window_size: usize,
    pub anomaly_min_samples: usize,
    pub monitoring_interval: Duration,
    /// Metrics snapshot cadence, in cycles
    pub metrics_every_n_cycles: u64,
    /// Upper bound on transactions pulled per cycle
    pub max_batch_size: usize,
    /// Per-entity alert cooldown; zero keeps one alert per triggering check
    pub alert_cooldown: Duration,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            client_exposure_threshold: 1_000_000.0,
            symbol_exposure_threshold: 500_000.0,
            velocity_threshold: 10,
            velocity_window: Duration::from_secs(60),
            velocity_capacity: 100,
            anomaly_z_threshold: 3.0,
            anomaly_high_severity_z: 4.0,
            anomaly_window_size: 100,
            anomaly_min_samples: 30,
            monitoring_interval: Duration::from_secs(5),
            metrics_every_n_cycles: 10,
            max_batch_size: 1000,
            alert_cooldown: Duration::ZERO,
        }
    }
}

impl RiskConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for unset variables. Unparseable or out-of-range values are
    /// errors, never clamped.
    pub fn from_env() -> Result<RiskConfig, ConfigError> {
        let mut config = RiskConfig::default();

        if let Some(v) = env_parse("CLIENT_EXPOSURE_THRESHOLD")? {
            config.client_exposure_threshold = v;
        }
        if let Some(v) = env_parse("SYMBOL_EXPOSURE_THRESHOLD")? {
            config.symbol_exposure_threshold = v;
        }
        if let Some(v) = env_parse("TRANSACTION_VELOCITY_THRESHOLD")? {
            config.velocity_threshold = v;
        }
        if let Some(v) = env_parse("VELOCITY_WINDOW_SECONDS")? {
            config.velocity_window = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("VELOCITY_TRACKER_CAPACITY")? {
            config.velocity_capacity = v;
        }
        if let Some(v) = env_parse("ANOMALY_DETECTION_THRESHOLD")? {
            config.anomaly_z_threshold = v;
        }
        if let Some(v) = env_parse("ANOMALY_HIGH_SEVERITY_Z")? {
            config.anomaly_high_severity_z = v;
        }
        if let Some(v) = env_parse("ANOMALY_WINDOW_SIZE")? {
            config.anomaly_window_size = v;
        }
        if let Some(v) = env_parse("ANOMALY_MIN_SAMPLES")? {
            config.anomaly_min_samples = v;
        }
        if let Some(v) = env_parse("MONITORING_INTERVAL_SECONDS")? {
            config.monitoring_interval = Duration::from_secs(v);
        }
        if let Some(v) = env_parse("METRICS_EVERY_N_CYCLES")? {
            config.metrics_every_n_cycles = v;
        }
        if let Some(v) = env_parse("MAX_BATCH_SIZE")? {
            config.max_batch_size = v;
        }
        if let Some(v) = env_parse("ALERT_COOLDOWN_SECONDS")? {
            config.alert_cooldown = Duration::from_secs(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("CLIENT_EXPOSURE_THRESHOLD", self.client_exposure_threshold)?;
        require_positive("SYMBOL_EXPOSURE_THRESHOLD", self.symbol_exposure_threshold)?;
        require_positive("ANOMALY_DETECTION_THRESHOLD", self.anomaly_z_threshold)?;
        require_positive("ANOMALY_HIGH_SEVERITY_Z", self.anomaly_high_severity_z)?;

        if self.anomaly_high_severity_z < self.anomaly_z_threshold {
            return Err(invalid(
                "ANOMALY_HIGH_SEVERITY_Z",
                format!(
                    "must be at least the detection threshold ({})",
                    self.anomaly_z_threshold
                ),
            ));
        }
        if self.velocity_threshold == 0 {
            return Err(invalid("TRANSACTION_VELOCITY_THRESHOLD", "must be > 0"));
        }
        if self.velocity_window.is_zero() {
            return Err(invalid("VELOCITY_WINDOW_SECONDS", "must be > 0"));
        }
        if self.velocity_capacity <= self.velocity_threshold as usize {
            return Err(invalid(
                "VELOCITY_TRACKER_CAPACITY",
                format!(
                    "must exceed the velocity threshold ({})",
                    self.velocity_threshold
                ),
            ));
        }
        if self.anomaly_window_size == 0 {
            return Err(invalid("ANOMALY_WINDOW_SIZE", "must be > 0"));
        }
        if self.anomaly_min_samples == 0 || self.anomaly_min_samples > self.anomaly_window_size {
            return Err(invalid(
                "ANOMALY_MIN_SAMPLES",
                format!("must be between 1 and {}", self.anomaly_window_size),
            ));
        }
        if self.monitoring_interval.is_zero() {
            return Err(invalid("MONITORING_INTERVAL_SECONDS", "must be > 0"));
        }
        if self.metrics_every_n_cycles == 0 {
            return Err(invalid("METRICS_EVERY_N_CYCLES", "must be > 0"));
        }
        if self.max_batch_size == 0 {
            return Err(invalid("MAX_BATCH_SIZE", "must be > 0"));
        }

        Ok(())
    }

    pub fn anomaly_config(&self) -> AnomalyConfig {
        AnomalyConfig {
            window_size: self.anomaly_window_size,
            min_samples: self.anomaly_min_samples,
            z_threshold: self.anomaly_z_threshold,
            high_severity_z: self.anomaly_high_severity_z,
        }
    }
}

/// Alert notification channels
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub slack_webhook_url: Option<url::Url>,
    pub log_alerts: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            log_alerts: true,
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Result<NotificationConfig, ConfigError> {
        let mut config = NotificationConfig::default();

        if let Ok(raw) = std::env::var("SLACK_WEBHOOK_URL") {
            if !raw.trim().is_empty() {
                let parsed = url::Url::parse(raw.trim()).map_err(|e| ConfigError::Parse {
                    name: "SLACK_WEBHOOK_URL",
                    value: raw.clone(),
                    reason: e.to_string(),
                })?;
                config.slack_webhook_url = Some(parsed);
            }
        }

        if let Some(enabled) = env_flag("LOG_ALERTS")? {
            config.log_alerts = enabled;
        }

        Ok(config)
    }
}

/// Address for the health/stats endpoints
pub fn status_addr_from_env() -> Result<SocketAddr, ConfigError> {
    Ok(env_parse("STATUS_ADDR")?.unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000))))
}

pub(crate) fn env_parse<T>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

/// Boolean switch: true/false, 1/0, yes/no, on/off (case-insensitive)
pub(crate) fn env_flag(name: &'static str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => parse_flag(name, &raw).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            name,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_value<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Parse {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a positive number, got {}", value)))
    }
}

pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.into(),
    }
}
