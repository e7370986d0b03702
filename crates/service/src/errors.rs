use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("corrupt cart data: {0}")]
    Corrupt(String),
    #[error("busy: {0}")]
    Busy(String),
}

impl ServiceError {
    pub fn backend(e: impl std::fmt::Display) -> Self { Self::Backend(e.to_string()) }
}
