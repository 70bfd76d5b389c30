pub mod monitoring_actor;

pub use monitoring_actor::{spawn_monitoring_actor, MonitoringHandle, MonitoringMessage};
