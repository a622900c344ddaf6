//! pirlink-serial - Host links for BM22S402x sensors
//!
//! This crate provides [`pirlink_core::Transport`] implementations for a
//! PC talking to the sensor module, either directly through a USB-serial
//! adapter or through a serial-to-TCP bridge.
//!
//! # Supported Links
//!
//! - Serial port: `/dev/ttyUSB0`, `/dev/ttyACM0`, `COM1`, etc.
//! - TCP socket: `host:port`
//!
//! # Example
//!
//! ```no_run
//! use pirlink_core::Bm22s402;
//! use pirlink_serial::SerialTransport;
//!
//! let transport = SerialTransport::open("/dev/ttyUSB0", None)?;
//! let mut sensor = Bm22s402::new(transport);
//! println!("{:.1} degC", sensor.temperature()?.celsius());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod transport;

pub use error::{LinkError, Result};
pub use transport::serial::SerialTransport;
pub use transport::tcp::TcpTransport;

use pirlink_core::Transport;

/// Connection options for a host link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkConnection {
    /// Serial port connection
    Serial {
        /// Device path (e.g., "/dev/ttyUSB0" or "COM1")
        device: String,
        /// Baud rate (None for the module's 38400)
        baud: Option<u32>,
    },
    /// TCP socket connection
    Tcp {
        /// Hostname or IP address
        host: String,
        /// Port number
        port: u16,
    },
}

impl LinkConnection {
    /// Parse a connection string
    ///
    /// Formats:
    /// - `dev=/dev/ttyUSB0` - Serial with default baud
    /// - `dev=/dev/ttyUSB0:9600` - Serial with specified baud
    /// - `ip=host:port` - TCP connection
    pub fn parse(s: &str) -> Result<Self> {
        if let Some(dev) = s.strip_prefix("dev=") {
            if dev.is_empty() {
                return Err(LinkError::InvalidParameter(
                    "Empty device in dev= parameter".into(),
                ));
            }
            match dev.rsplit_once(':') {
                Some((device, baud_str)) => {
                    let baud = baud_str.parse().map_err(|_| {
                        LinkError::InvalidParameter(format!("Invalid baud rate: {}", baud_str))
                    })?;
                    Ok(LinkConnection::Serial {
                        device: device.to_string(),
                        baud: Some(baud),
                    })
                }
                None => Ok(LinkConnection::Serial {
                    device: dev.to_string(),
                    baud: None,
                }),
            }
        } else if let Some(ip) = s.strip_prefix("ip=") {
            let (host, port_str) = ip.rsplit_once(':').ok_or_else(|| {
                LinkError::InvalidParameter("Missing port in ip= parameter".into())
            })?;
            let port = port_str
                .parse()
                .map_err(|_| LinkError::InvalidParameter(format!("Invalid port: {}", port_str)))?;
            Ok(LinkConnection::Tcp {
                host: host.to_string(),
                port,
            })
        } else {
            Err(LinkError::InvalidParameter(format!(
                "Invalid connection string: {}. Use dev=... or ip=...",
                s
            )))
        }
    }

    /// Open the link and return it type-erased
    pub fn open(&self) -> Result<Box<dyn Transport>> {
        match self {
            LinkConnection::Serial { device, baud } => {
                Ok(Box::new(SerialTransport::open(device, *baud)?))
            }
            LinkConnection::Tcp { host, port } => Ok(Box::new(TcpTransport::connect(host, *port)?)),
        }
    }
}

/// Open a link from a connection string
///
/// Convenience wrapper around [`LinkConnection::parse`] and
/// [`LinkConnection::open`].
pub fn open_link(options: &str) -> Result<Box<dyn Transport>> {
    LinkConnection::parse(options)?.open()
}

/// Open a serial port link
pub fn open_serial(device: &str, baud: Option<u32>) -> Result<SerialTransport> {
    SerialTransport::open(device, baud)
}

/// Open a TCP bridge link
pub fn open_tcp(host: &str, port: u16) -> Result<TcpTransport> {
    TcpTransport::connect(host, port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serial() {
        assert_eq!(
            LinkConnection::parse("dev=/dev/ttyUSB0").unwrap(),
            LinkConnection::Serial {
                device: "/dev/ttyUSB0".into(),
                baud: None
            }
        );
        assert_eq!(
            LinkConnection::parse("dev=COM3:9600").unwrap(),
            LinkConnection::Serial {
                device: "COM3".into(),
                baud: Some(9600)
            }
        );
    }

    #[test]
    fn test_parse_tcp() {
        assert_eq!(
            LinkConnection::parse("ip=192.168.1.20:4000").unwrap(),
            LinkConnection::Tcp {
                host: "192.168.1.20".into(),
                port: 4000
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(LinkConnection::parse("dev=").is_err());
        assert!(LinkConnection::parse("dev=/dev/ttyUSB0:fast").is_err());
        assert!(LinkConnection::parse("ip=localhost").is_err());
        assert!(LinkConnection::parse("ip=localhost:99999").is_err());
        assert!(LinkConnection::parse("/dev/ttyUSB0").is_err());
    }
}
