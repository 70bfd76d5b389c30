use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::ValidationError;
use crate::domain::value_objects::risk_level::RiskLevel;

/// Which aggregate table an exposure row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposureKind {
    Client,
    Symbol,
}

impl fmt::Display for ExposureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureKind::Client => write!(f, "client"),
            ExposureKind::Symbol => write!(f, "symbol"),
        }
    }
}

/// Aggregate exposure for one client or one symbol.
///
/// The row is created and totalled by an external writer; only `risk_level`
/// is written back by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityExposure {
    pub key: String,
    pub total_exposure: f64,
    pub count: i64,
    pub risk_level: RiskLevel,
    pub last_updated: DateTime<Utc>,
}

impl EntityExposure {
    pub fn new(key: impl Into<String>, total_exposure: f64) -> Self {
        Self {
            key: key.into(),
            total_exposure,
            count: 0,
            risk_level: RiskLevel::Low,
            last_updated: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.total_exposure > 0.0
    }

    /// Rows with a negative or non-finite total cannot be classified
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.total_exposure.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        if self.total_exposure < 0.0 {
            return Err(ValidationError::NegativeExposure(self.total_exposure));
        }
        Ok(())
    }
}
