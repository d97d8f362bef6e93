pub mod booking;
pub mod catalog;
pub mod identity;
pub mod memory;
pub mod payment;
pub mod repository;
pub mod seat;
pub mod signature;

/// Error taxonomy shared by every layer of the booking core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Signature mismatch for transaction {0}")]
    SignatureMismatch(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
