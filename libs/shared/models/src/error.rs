use thiserror::Error;

/// Failures reported by the external store collaborators. The core never
/// builds storage queries itself; stores surface these through the
/// repository traits and each cell maps them into its own error taxonomy.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store error: {0}")]
    Internal(String),
}
