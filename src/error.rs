use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Policy already exists: {0}")]
    AlreadyExists(String),
    #[error("Policy not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Transaction failure: {0}")]
    Transaction(String),
    #[error("Storage failure: {0}")]
    Backend(#[from] rusqlite::Error),
    #[error("Statement had no effect: {0}")]
    NoEffect(String),
    #[error("Operation cancelled: {0}")]
    Cancelled(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, AdapterError>;

/// True when the backend rejected a statement because of the uniqueness
/// constraint over `(ptype, coalesce(v0,'')..coalesce(v5,''))`.
pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}
