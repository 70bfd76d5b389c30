pub mod alert;
pub mod exposure;
pub mod metrics_snapshot;
pub mod transaction;
