use uuid::Uuid;

/// Failures surfaced by plant store operations.
#[derive(Debug, thiserror::Error)]
pub enum PlantError {
    /// Missing or malformed plant fields.
    #[error("invalid plant data: {0}")]
    Validation(String),

    #[error("plant {0} not found")]
    NotFound(Uuid),

    /// Date-range query with a missing or unparsable bound.
    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}
