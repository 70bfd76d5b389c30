//! Riskwatch Library
//!
//! Continuous risk monitoring over a brokerage transaction feed: exposure
//! thresholds, transaction velocity and statistical outliers, with alerts
//! persisted and fanned out to notification channels.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
