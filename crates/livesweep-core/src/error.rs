use thiserror::Error;

/// Errors raised while parsing core values from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid IPv4 address: {0}")]
    InvalidAddress(String),

    #[error("Invalid address range: {0}")]
    InvalidRange(String),

    #[error("Invalid sampling policy: {0}. Choose: edge_only, sample, full")]
    InvalidPolicy(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
