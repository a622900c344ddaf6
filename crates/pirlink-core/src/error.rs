//! Error types for pirlink-core
//!
//! This module provides a no_std compatible error type shared by the
//! engine, the device facade and every transport.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
///
/// None of these leave the engine in a bad state: every operation can be
/// retried by the caller as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Reply frame failed checksum verification
    Checksum,
    /// Expected bytes never arrived within the per-byte timeout
    Timeout,
    /// Device answered with the error pattern, or echoed another command
    Command,
    /// Device accepted the write but echoed a different value
    ValueMismatch,
    /// The underlying link failed
    Io,
    /// Parameter does not fit the command it was passed to
    InvalidParameter,
}

impl Error {
    /// Numeric status code as used by the vendor library
    ///
    /// `0` is success and is never produced here. `Io` and
    /// `InvalidParameter` have no vendor equivalent and use 5 and 6.
    pub const fn status_code(self) -> u8 {
        match self {
            Self::Checksum => 1,
            Self::Timeout => 2,
            Self::Command => 3,
            Self::ValueMismatch => 4,
            Self::Io => 5,
            Self::InvalidParameter => 6,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checksum => write!(f, "reply checksum mismatch"),
            Self::Timeout => write!(f, "timed out waiting for reply"),
            Self::Command => write!(f, "command rejected by device"),
            Self::ValueMismatch => write!(f, "setting failed: device echoed a different value"),
            Self::Io => write!(f, "I/O error on link"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
