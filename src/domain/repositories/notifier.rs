use async_trait::async_trait;

use crate::domain::entities::alert::Alert;

/// Delivers a created alert to its notification channels.
///
/// Fire-and-forget: implementations handle and log their own failures, so
/// nothing is returned to the caller.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn send(&self, alert: &Alert);
}
