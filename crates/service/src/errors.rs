use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("index {index} out of range for collection of length {len}")]
    OutOfRange { index: i64, len: usize },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("deserialization error: {0}")]
    Deserialization(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ServiceError {
    pub fn persistence(e: impl std::fmt::Display) -> Self {
        Self::Persistence(e.to_string())
    }
}
