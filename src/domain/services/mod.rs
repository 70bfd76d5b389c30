pub mod alert_factory;
pub mod alert_suppressor;
pub mod anomaly_detector;
pub mod event_rate_tracker;
pub mod exposure_classifier;
pub mod metrics_aggregator;
pub mod numeric_window;
