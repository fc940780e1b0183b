use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlatformError>;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Name conflict: {0}")]
    Conflict(String),

    #[error("Missing permission: {0}")]
    Forbidden(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PlatformError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
