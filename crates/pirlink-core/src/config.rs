//! Link timing configuration
//!
//! Defaults follow the module datasheet. With the `std` feature a
//! configuration can be loaded from TOML; missing keys keep their default:
//!
//! ```toml
//! baud_rate = 38400
//! byte_timeout_ms = 10
//! poll_retries = 10
//! poll_interval_ms = 50
//! ```

use crate::protocol::BAUD_RATE;

/// Timing parameters for one sensor link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct LinkConfig {
    /// Serial link speed
    pub baud_rate: u32,
    /// How long to wait for each reply byte
    pub byte_timeout_ms: u32,
    /// Pause between sending a command and reading its reply
    pub reply_wait_ms: u32,
    /// Quiet time the device needs after every command
    pub settle_ms: u32,
    /// Extra wait after an acknowledged software reset
    pub reset_settle_ms: u32,
    /// Extra wait after an acknowledged sleep command
    pub sleep_settle_ms: u32,
    /// Retries after the first attempt when polling for auto-mode packets
    pub poll_retries: u8,
    /// Pause between auto-mode poll attempts
    pub poll_interval_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            byte_timeout_ms: 10,
            reply_wait_ms: 10,
            settle_ms: 10,
            reset_settle_ms: 1000,
            sleep_settle_ms: 100,
            poll_retries: 10,
            poll_interval_ms: 50,
        }
    }
}

#[cfg(feature = "std")]
mod load {
    use super::LinkConfig;
    use std::fmt;
    use std::path::Path;
    use std::string::String;

    /// Failure while loading a configuration file
    #[derive(Debug)]
    pub enum ConfigError {
        /// File could not be read
        Io(std::io::Error),
        /// File is not a valid configuration
        Parse(String),
    }

    impl fmt::Display for ConfigError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Io(e) => write!(f, "cannot read config: {}", e),
                Self::Parse(msg) => write!(f, "invalid config: {}", msg),
            }
        }
    }

    impl std::error::Error for ConfigError {}

    impl LinkConfig {
        /// Parse a configuration from TOML text
        pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
            toml::from_str(s).map_err(|e| ConfigError::Parse(e.message().into()))
        }

        /// Load a configuration from a TOML file
        pub fn load(path: &Path) -> Result<Self, ConfigError> {
            let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
            let config = Self::from_toml_str(&text)?;
            log::debug!("Loaded link config from {}", path.display());
            Ok(config)
        }
    }
}

#[cfg(feature = "std")]
pub use load::ConfigError;
