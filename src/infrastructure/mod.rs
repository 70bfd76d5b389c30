//! Adapters outside the domain: notification channels, plus in-memory
//! collaborators for unit tests.

#[cfg(test)]
pub(crate) mod in_memory;
pub mod log_channel;
pub mod slack_channel;
