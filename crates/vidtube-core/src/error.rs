use thiserror::Error;

/// Failure reported by an [`EntityStore`](crate::EntityStore) adapter.
#[derive(Debug, Error)]
#[error("store operation failed: {0}")]
pub struct StoreError(#[from] anyhow::Error);

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or missing id, or a self-referential subscription.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist. Zero-row joins never produce this.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A concurrent toggle raced this one on the same edge.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    StoreFailure(#[from] StoreError),
}

impl CoreError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
