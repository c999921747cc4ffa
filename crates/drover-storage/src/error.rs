use thiserror::Error;

pub type StoreResult<T> = Result<T, CatalogError>;

/// Failures surfaced by catalog backends. Backend messages are passed through verbatim; nothing
/// here is retried.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    InvalidArgument,
    BackendUnavailable,
    Backend,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NotFound { .. } => ErrorKind::NotFound,
            CatalogError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            CatalogError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CatalogError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            CatalogError::Backend(_) => ErrorKind::Backend,
        }
    }
}

impl From<drover_core::UnknownField> for CatalogError {
    fn from(err: drover_core::UnknownField) -> Self {
        CatalogError::InvalidArgument(err.to_string())
    }
}
