//! Transport layer abstraction for the sensor link
//!
//! The engine only needs a byte-oriented duplex channel plus a millisecond
//! delay. Host builds use the serial/TCP transports from `pirlink-serial`;
//! firmware wraps its UART with [`io::IoTransport`].

use crate::error::Result;

/// Transport trait for talking to the sensor
pub trait Transport {
    /// Write all bytes to the link
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Number of received bytes that can be read without blocking
    fn available(&mut self) -> Result<usize>;

    /// Read one received byte
    ///
    /// Never blocks: returns `Ok(None)` when nothing is buffered.
    fn read_byte(&mut self) -> Result<Option<u8>>;

    /// Discard any pending received bytes
    fn clear(&mut self) -> Result<()> {
        while self.read_byte()?.is_some() {}
        Ok(())
    }

    /// Delay for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

#[cfg(feature = "alloc")]
impl<T: Transport + ?Sized> Transport for alloc::boxed::Box<T> {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn available(&mut self) -> Result<usize> {
        (**self).available()
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        (**self).read_byte()
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

pub mod io {
    //! `embedded-io` UART adapter
    //!
    //! UART drivers usually only report whether *some* data is ready, while
    //! the packet finder needs an exact count. Ready bytes are drained into
    //! a fixed-size FIFO, which then answers `available()`.

    use super::Transport;
    use crate::error::{Error, Result};
    use embedded_io::{Read, ReadReady, Write};
    use heapless::Deque;

    /// Receive FIFO depth used when none is specified
    pub const DEFAULT_RX_DEPTH: usize = 64;

    /// Transport over any `embedded-io` UART
    pub struct IoTransport<U, D, const N: usize = DEFAULT_RX_DEPTH> {
        uart: U,
        delay: D,
        rx: Deque<u8, N>,
    }

    impl<U, D, const N: usize> IoTransport<U, D, N>
    where
        U: Read + Write + ReadReady,
        D: FnMut(u32),
    {
        /// Wrap a UART and a millisecond delay function
        pub fn new(uart: U, delay: D) -> Self {
            Self {
                uart,
                delay,
                rx: Deque::new(),
            }
        }

        /// Give back the wrapped UART, dropping anything still buffered
        pub fn release(self) -> U {
            self.uart
        }

        /// Move every ready byte into the FIFO
        fn pump(&mut self) -> Result<()> {
            while !self.rx.is_full() && self.uart.read_ready().map_err(uart_error)? {
                let mut byte = [0u8];
                if self.uart.read(&mut byte).map_err(uart_error)? == 0 {
                    break;
                }
                // Cannot fail, fullness is checked above
                let _ = self.rx.push_back(byte[0]);
            }
            Ok(())
        }
    }

    fn uart_error<E: embedded_io::Error>(e: E) -> Error {
        log::debug!("pirlink: UART error {:?}", e.kind());
        Error::Io
    }

    impl<U, D, const N: usize> Transport for IoTransport<U, D, N>
    where
        U: Read + Write + ReadReady,
        D: FnMut(u32),
    {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.uart.write_all(data).map_err(uart_error)?;
            self.uart.flush().map_err(uart_error)
        }

        fn available(&mut self) -> Result<usize> {
            self.pump()?;
            Ok(self.rx.len())
        }

        fn read_byte(&mut self) -> Result<Option<u8>> {
            if self.rx.is_empty() {
                self.pump()?;
            }
            Ok(self.rx.pop_front())
        }

        fn clear(&mut self) -> Result<()> {
            self.rx.clear();
            loop {
                self.pump()?;
                if self.rx.is_empty() {
                    return Ok(());
                }
                self.rx.clear();
            }
        }

        fn delay_ms(&mut self, ms: u32) {
            (self.delay)(ms)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::VecDeque;
        use std::vec::Vec;

        /// Loopback-ish UART: writes are recorded, reads come from `incoming`
        #[derive(Default)]
        struct FakeUart {
            incoming: VecDeque<u8>,
            written: Vec<u8>,
        }

        impl embedded_io::ErrorType for FakeUart {
            type Error = core::convert::Infallible;
        }

        impl Read for FakeUart {
            fn read(&mut self, buf: &mut [u8]) -> core::result::Result<usize, Self::Error> {
                let mut n = 0;
                while n < buf.len() {
                    match self.incoming.pop_front() {
                        Some(b) => {
                            buf[n] = b;
                            n += 1;
                        }
                        None => break,
                    }
                }
                Ok(n)
            }
        }

        impl ReadReady for FakeUart {
            fn read_ready(&mut self) -> core::result::Result<bool, Self::Error> {
                Ok(!self.incoming.is_empty())
            }
        }

        impl Write for FakeUart {
            fn write(&mut self, buf: &[u8]) -> core::result::Result<usize, Self::Error> {
                self.written.extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> core::result::Result<(), Self::Error> {
                Ok(())
            }
        }

        #[test]
        fn test_available_counts_buffered_bytes() {
            let mut uart = FakeUart::default();
            uart.incoming.extend([1u8, 2, 3, 4, 5]);
            let mut link: IoTransport<_, _, 4> = IoTransport::new(uart, |_| {});

            // FIFO depth caps the count; the rest stays in the UART
            assert_eq!(link.available().unwrap(), 4);
            assert_eq!(link.read_byte().unwrap(), Some(1));
            assert_eq!(link.available().unwrap(), 4);

            link.clear().unwrap();
            assert_eq!(link.available().unwrap(), 0);
            assert_eq!(link.read_byte().unwrap(), None);
        }

        #[test]
        fn test_write_and_delay_pass_through() {
            let mut slept = 0u32;
            {
                let mut link = IoTransport::<_, _>::new(FakeUart::default(), |ms| slept += ms);
                link.write(&[0xFB, 0x10, 0x00, 0x10]).unwrap();
                link.delay_ms(7);
                link.delay_ms(3);
                assert_eq!(link.release().written, [0xFB, 0x10, 0x00, 0x10]);
            }
            assert_eq!(slept, 10);
        }
    }
}
