use thiserror::Error;

/// Failures of a data-backed request.
///
/// An aborted advance call leaves nothing behind: the caller still holds the
/// pre-play state and may retry with the same input.
#[derive(Debug, Error)]
pub enum SimError {
    /// No row matched the lookup key.
    #[error("situation not found: {0}")]
    SituationNotFound(String),

    /// A row came back but could not be used (wrong shape, ambiguous match).
    #[error("malformed {table} row: {reason}")]
    MalformedRow { table: &'static str, reason: String },

    /// The data store answered with a non-success status.
    #[error("data store query on {table} failed ({status}): {body}")]
    StoreStatus { table: &'static str, status: u16, body: String },

    /// Request parameters out of range.
    #[error("{0}")]
    InvalidQuery(String),

    /// Transport-level failure talking to the data store.
    #[error("data store unavailable: {0}")]
    DataStore(#[from] reqwest::Error),
}

impl SimError {
    pub fn malformed(table: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedRow { table, reason: reason.into() }
    }
}
