use crate::store::StoreError;

pub type CoreResult<T> = Result<T, CoreError>;

/// Failures crossing the core boundary.
///
/// "No such ranking" and "ephemeris unavailable" are not errors: those
/// operations return `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lookup failed: {0}")]
    Store(#[from] StoreError),
}
