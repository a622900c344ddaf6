//! Error types for host links

use thiserror::Error;

/// Errors raised while opening or driving a host link
#[derive(Debug, Error)]
pub enum LinkError {
    /// Failed to connect to a serial bridge
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Malformed connection string or option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// I/O error during communication
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Result type for link operations
pub type Result<T> = core::result::Result<T, LinkError>;

impl From<LinkError> for pirlink_core::Error {
    fn from(e: LinkError) -> Self {
        log::debug!("pirlink: link error: {}", e);
        pirlink_core::Error::Io
    }
}

/// Log a low-level failure and collapse it into the core error type
pub(crate) fn link_failed(e: impl Into<LinkError>) -> pirlink_core::Error {
    pirlink_core::Error::from(e.into())
}
