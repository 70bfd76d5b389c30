//! Collaborator interfaces
//!
//! The engine reads and writes only through these traits. SQLite and
//! in-memory implementations live in `persistence` and `infrastructure`.

pub mod alert_sink;
pub mod exposure_store;
pub mod metrics_sink;
pub mod notifier;
pub mod transaction_source;

pub use alert_sink::AlertSink;
pub use exposure_store::ExposureStore;
pub use metrics_sink::MetricsSink;
pub use notifier::AlertNotifier;
pub use transaction_source::TransactionSource;

use crate::domain::errors::StoreError;

/// Common result type for collaborator operations
pub type StoreResult<T> = Result<T, StoreError>;
