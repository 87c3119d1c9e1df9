use streammath_types::SqlType;
use thiserror::Error;

/// Errors raised while an aggregate processes events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("percentile expects {expected} values, but received {found}")]
    TypeMismatch { expected: SqlType, found: SqlType },
}

/// Errors raised while encoding or decoding a percentile snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("failed to encode percentile snapshot: {0}")]
    Encode(String),

    #[error("corrupted percentile snapshot: {0}")]
    Corrupted(String),

    #[error("invalid percentile snapshot: {0}")]
    Json(String),
}

impl From<serde_json::Error> for SnapshotError {
    fn from(error: serde_json::Error) -> Self {
        SnapshotError::Json(error.to_string())
    }
}
