//! Host transports for the sensor link
//!
//! Both transports keep a small receive buffer so `available` can report an
//! exact byte count and `read_byte` never blocks.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use pirlink_core::error::Result;
use pirlink_core::Transport;

use crate::error::link_failed;

/// Size of a single read from the OS
const READ_CHUNK: usize = 64;

fn sleep_ms(ms: u32) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

pub mod serial {
    //! Serial port transport implementation

    use super::*;
    use pirlink_core::protocol::BAUD_RATE;
    use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{Read, Write};

    /// Serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
        rx: VecDeque<u8>,
    }

    impl SerialTransport {
        /// Open a serial port, 8N1 without flow control
        ///
        /// Uses the module's 38400 baud unless another rate is given.
        pub fn open(device: &str, baud: Option<u32>) -> crate::error::Result<Self> {
            let baud_rate = baud.unwrap_or(BAUD_RATE);

            let port = serialport::new(device, baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_millis(100))
                .open()?;

            log::info!("Opened serial port {} at {} baud", device, baud_rate);

            Ok(Self {
                port,
                rx: VecDeque::with_capacity(READ_CHUNK),
            })
        }

        /// Move whatever the OS has buffered into our queue
        fn fill(&mut self) -> crate::error::Result<()> {
            let pending = self.port.bytes_to_read()? as usize;
            if pending == 0 {
                return Ok(());
            }
            let mut chunk = [0u8; READ_CHUNK];
            let want = pending.min(READ_CHUNK);
            let n = self.port.read(&mut chunk[..want])?;
            self.rx.extend(&chunk[..n]);
            Ok(())
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.port.write_all(data).map_err(link_failed)?;
            self.port.flush().map_err(link_failed)
        }

        fn available(&mut self) -> Result<usize> {
            let pending = self.port.bytes_to_read().map_err(link_failed)?;
            Ok(self.rx.len() + pending as usize)
        }

        fn read_byte(&mut self) -> Result<Option<u8>> {
            if self.rx.is_empty() {
                self.fill()?;
            }
            Ok(self.rx.pop_front())
        }

        fn clear(&mut self) -> Result<()> {
            self.rx.clear();
            self.port.clear(ClearBuffer::Input).map_err(link_failed)
        }

        fn delay_ms(&mut self, ms: u32) {
            sleep_ms(ms);
        }
    }
}

pub mod tcp {
    //! TCP transport for serial-to-network bridges

    use super::*;
    use crate::error::LinkError;
    use std::io::{ErrorKind, Read, Write};
    use std::net::TcpStream;

    /// TCP socket transport
    pub struct TcpTransport {
        stream: TcpStream,
        rx: VecDeque<u8>,
        /// Peer has shut down its side; `rx` still holds what it sent
        closed: bool,
    }

    impl TcpTransport {
        /// Connect to a bridge at the specified host and port
        pub fn connect(host: &str, port: u16) -> crate::error::Result<Self> {
            let addr = format!("{}:{}", host, port);
            log::info!("Connecting to serial bridge at {}", addr);

            let stream = TcpStream::connect(&addr)
                .map_err(|e| LinkError::ConnectionFailed(e.to_string()))?;

            stream.set_nodelay(true).map_err(|e| {
                LinkError::ConnectionFailed(format!("Failed to set TCP_NODELAY: {}", e))
            })?;
            stream.set_nonblocking(true).map_err(|e| {
                LinkError::ConnectionFailed(format!("Failed to set non-blocking mode: {}", e))
            })?;

            log::info!("Connected to serial bridge at {}", addr);

            Ok(Self {
                stream,
                rx: VecDeque::with_capacity(READ_CHUNK),
                closed: false,
            })
        }

        /// Drain the socket without blocking
        ///
        /// Only fails once the bridge has closed and every byte it sent has
        /// been consumed.
        fn fill(&mut self) -> crate::error::Result<()> {
            let mut chunk = [0u8; READ_CHUNK];
            while !self.closed {
                match self.stream.read(&mut chunk) {
                    Ok(0) => {
                        log::debug!("pirlink: bridge closed the connection");
                        self.closed = true;
                    }
                    Ok(n) => self.rx.extend(&chunk[..n]),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }

            if self.rx.is_empty() {
                Err(LinkError::ConnectionFailed(
                    "Bridge closed the connection".into(),
                ))
            } else {
                Ok(())
            }
        }
    }

    impl Transport for TcpTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            let mut rest = data;
            while !rest.is_empty() {
                match self.stream.write(rest) {
                    Ok(n) => rest = &rest[n..],
                    Err(e) if e.kind() == ErrorKind::WouldBlock => sleep_ms(1),
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(link_failed(e)),
                }
            }
            Ok(())
        }

        fn available(&mut self) -> Result<usize> {
            self.fill()?;
            Ok(self.rx.len())
        }

        fn read_byte(&mut self) -> Result<Option<u8>> {
            if self.rx.is_empty() {
                self.fill()?;
            }
            Ok(self.rx.pop_front())
        }

        fn clear(&mut self) -> Result<()> {
            self.fill()?;
            self.rx.clear();
            Ok(())
        }

        fn delay_ms(&mut self, ms: u32) {
            sleep_ms(ms);
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::net::TcpListener;

        #[test]
        fn test_tcp_round_trip() {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();

            let bridge = thread::spawn(move || {
                let (mut sock, _) = listener.accept().unwrap();
                let mut frame = [0u8; 4];
                sock.read_exact(&mut frame).unwrap();
                // Status register reply
                sock.write_all(&[0xFB, 0x0C, 0x01, 0x20, 0x2D]).unwrap();
                frame
            });

            let transport = TcpTransport::connect("127.0.0.1", port).unwrap();
            let config = pirlink_core::LinkConfig {
                byte_timeout_ms: 500,
                ..Default::default()
            };
            let mut sensor = pirlink_core::Bm22s402::with_config(transport, config);
            let status = sensor.status().unwrap();
            assert!(status.contains(pirlink_core::StatusFlags::STABLE));
            assert_eq!(bridge.join().unwrap(), [0xFB, 0x0C, 0x00, 0x0C]);
        }

        #[test]
        fn test_reply_survives_bridge_close() {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = listener.local_addr().unwrap().port();

            let bridge = thread::spawn(move || {
                let (mut sock, _) = listener.accept().unwrap();
                let mut frame = [0u8; 4];
                sock.read_exact(&mut frame).unwrap();
                sock.write_all(&[0xFB, 0x0C, 0x01, 0x20, 0x2D]).unwrap();
                // Socket dropped here
            });

            let mut link = TcpTransport::connect("127.0.0.1", port).unwrap();
            link.write(&[0xFB, 0x0C, 0x00, 0x0C]).unwrap();
            bridge.join().unwrap();

            let mut waited = 0;
            while link.available().unwrap() < 5 && waited < 1000 {
                link.delay_ms(1);
                waited += 1;
            }
            assert_eq!(link.available().unwrap(), 5);

            let mut reply = Vec::new();
            while let Some(b) = link.read_byte().unwrap() {
                reply.push(b);
                if reply.len() == 5 {
                    break;
                }
            }
            assert_eq!(reply, [0xFB, 0x0C, 0x01, 0x20, 0x2D]);

            // Nothing left and nobody to send more
            assert_eq!(link.read_byte(), Err(pirlink_core::Error::Io));
            assert_eq!(link.available(), Err(pirlink_core::Error::Io));
        }
    }
}
