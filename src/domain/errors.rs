use thiserror::Error;

/// Errors raised by collaborator stores (transaction source, exposure store,
/// alert sink, metrics sink)
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Failed to decode row: {0}")]
    Decode(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound("row not found".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(e.to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Failure of one engine cycle step that aborts the rest of the cycle
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to fetch transactions after cursor {cursor}: {source}")]
    FetchTransactions {
        cursor: i64,
        #[source]
        source: StoreError,
    },

    #[error("Failed to list {kind} exposures: {source}")]
    ListExposures {
        kind: String,
        #[source]
        source: StoreError,
    },
}

/// Data inconsistency on a single record; the affected check is skipped
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Invalid price: {0}")]
    InvalidPrice(f64),

    #[error("Invalid side: {0}")]
    InvalidSide(String),

    #[error("Total value {actual} does not match quantity x price ({expected})")]
    TotalValueMismatch { expected: f64, actual: f64 },

    #[error("Exposure must be non-negative, got {0}")]
    NegativeExposure(f64),

    #[error("Value must be finite")]
    MustBeFinite,
}

/// Notification channel delivery failure
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Channel rejected alert: {0}")]
    Rejected(String),
}
