use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Platform error: {0}")]
    Platform(#[from] sponsor_platform::PlatformError),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
}
