use thiserror::Error;

use crate::remote::{RemoteError, RemoteErrorKind};

/// Failure of a facade call. The variant names the operation family,
/// the wrapped [`RemoteError`] says what went wrong on the wire.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(#[from] models::ModelError),
    #[error("remote write failed: {0}")]
    Write(RemoteError),
    #[error("remote read failed: {0}")]
    Read(RemoteError),
    #[error("remote lookup failed: {0}")]
    Lookup(RemoteError),
    #[error("remote delete failed: {0}")]
    Delete(RemoteError),
    #[error("configuration error: {0}")]
    Config(String),
}

impl ServiceError {
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ServiceError::Write(e) | ServiceError::Read(e) | ServiceError::Lookup(e) | ServiceError::Delete(e) => Some(e),
            ServiceError::Validation(_) | ServiceError::Config(_) => None,
        }
    }

    pub fn kind(&self) -> Option<RemoteErrorKind> { self.remote().map(|e| e.kind) }

    pub fn is_not_found(&self) -> bool { self.kind() == Some(RemoteErrorKind::NotFound) }

    pub fn is_conflict(&self) -> bool { self.kind() == Some(RemoteErrorKind::Conflict) }
}
