use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed alert or strategy shape. Rejected at ingestion before the
    /// core ever sees the data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Alert store or strategy registry unreachable. Caught per strategy;
    /// never aborts sibling evaluations.
    #[error("lookup error: {0}")]
    Lookup(String),

    /// Weight provider failure. Non-fatal: the affected condition scores 0.
    #[error("scoring error: {0}")]
    Scoring(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
