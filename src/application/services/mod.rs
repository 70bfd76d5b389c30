pub mod notification_dispatcher;
pub mod risk_engine;

pub use notification_dispatcher::{NotificationChannel, NotificationDispatcher};
pub use risk_engine::{CycleReport, EngineCollaborators, EngineStats, RiskEngine};
