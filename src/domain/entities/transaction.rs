use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::ValidationError;

/// Tolerance for `total_value == quantity * price`; the feed rounds totals to cents.
const TOTAL_VALUE_TOLERANCE: f64 = 0.01;

/// Direction of a brokerage transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionSide {
    Buy,
    Sell,
}

impl TransactionSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSide::Buy => "BUY",
            TransactionSide::Sell => "SELL",
        }
    }
}

impl fmt::Display for TransactionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionSide {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUY" => Ok(TransactionSide::Buy),
            "SELL" => Ok(TransactionSide::Sell),
            other => Err(ValidationError::InvalidSide(other.to_string())),
        }
    }
}

/// Immutable transaction record read from the feed.
///
/// Ids are assigned by the source and strictly increase across the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub client_id: String,
    pub symbol: String,
    pub side: TransactionSide,
    pub quantity: i64,
    pub price: f64,
    pub total_value: f64,
    pub broker_id: String,
    pub market: String,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Check the record invariants: positive quantity and price, finite values,
    /// and a total matching `quantity * price`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingField("client_id"));
        }
        if self.symbol.is_empty() {
            return Err(ValidationError::MissingField("symbol"));
        }
        if self.quantity <= 0 {
            return Err(ValidationError::InvalidQuantity(self.quantity));
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ValidationError::InvalidPrice(self.price));
        }
        if !self.total_value.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }

        let expected = self.quantity as f64 * self.price;
        if (expected - self.total_value).abs() > TOTAL_VALUE_TOLERANCE {
            return Err(ValidationError::TotalValueMismatch {
                expected,
                actual: self.total_value,
            });
        }

        Ok(())
    }
}

/// One row read from the transaction feed.
///
/// A row the store cannot decode keeps its id so the reader can move past it.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry {
    Decoded(Transaction),
    Undecodable { id: i64, reason: String },
}

impl FeedEntry {
    pub fn id(&self) -> i64 {
        match self {
            FeedEntry::Decoded(transaction) => transaction.id,
            FeedEntry::Undecodable { id, .. } => *id,
        }
    }
}

impl From<Transaction> for FeedEntry {
    fn from(transaction: Transaction) -> Self {
        FeedEntry::Decoded(transaction)
    }
}
