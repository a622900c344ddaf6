//! Framed protocol engine
//!
//! This module provides the `Engine` struct that owns the transport and
//! implements the command/reply exchange, the checksummed frame reader and
//! the header-resynchronizing packet finder used for auto-mode streams.

use crate::config::LinkConfig;
use crate::error::{Error, Result};
use crate::protocol::{
    cmd, is_error_reply, payload_len, reply_len, verify_checksum, CommandFrame, PacketKind,
    StatusFlags, FRAME_OVERHEAD, INFO_PACKET, INFO_PACKET_LEN, MAX_COMMAND_LEN, MAX_PACKET_LEN,
    MAX_REPLY_LEN, TRIGGER_PACKET,
};
use crate::transport::Transport;

/// Header mismatches tolerated by one packet search
pub const MAX_SYNC_FAILURES: u8 = 6;

/// How the device is currently believed to behave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Device streams info packets on its own
    Auto,
    /// Every reading needs a request/response exchange
    Command,
}

/// Protocol engine for one sensor
///
/// Starts out assuming auto mode. The first time a bounded poll for an
/// auto-mode packet comes up empty it switches to command mode for good.
pub struct Engine<T: Transport> {
    /// Transport layer
    transport: T,
    /// Link timings
    config: LinkConfig,
    /// Auto or command mode
    mode: Mode,
    /// Last info packet matched by `is_info_available`
    info: [u8; INFO_PACKET_LEN],
}

impl<T: Transport> Engine<T> {
    /// Create an engine with the default link timings
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LinkConfig::default())
    }

    /// Create an engine with custom link timings
    pub fn with_config(transport: T, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            mode: Mode::Auto,
            info: [0; INFO_PACKET_LEN],
        }
    }

    /// Current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Link timings in use
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Last info packet, all zeros if the latest poll found nothing
    pub fn info_packet(&self) -> &[u8; INFO_PACKET_LEN] {
        &self.info
    }

    /// Access the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the engine and return the transport
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Wait for the given number of milliseconds using the transport's clock
    pub fn delay_ms(&mut self, ms: u32) {
        self.transport.delay_ms(ms);
    }

    /// Write a register
    ///
    /// The device answers a write by echoing the frame. The echo must carry
    /// the same command and the same parameter byte(s), otherwise the setting
    /// was refused and `ValueMismatch` is returned.
    pub fn write_register(&mut self, cmd: u8, param: u16) -> Result<()> {
        let frame = CommandFrame::write(cmd, param)?;
        let result = self.exchange_write(&frame);
        self.transport.delay_ms(self.config.settle_ms);
        result
    }

    fn exchange_write(&mut self, frame: &CommandFrame) -> Result<()> {
        self.send(frame)?;

        let mut buf = [0u8; MAX_COMMAND_LEN];
        let reply = &mut buf[..frame.len()];
        self.read_frame(reply, self.config.byte_timeout_ms)?;
        check_echo(frame.command(), reply)?;

        let params = frame.params();
        if reply[3..3 + params.len()] != *params {
            log::warn!(
                "pirlink: register 0x{:02X} wrote {:02X?}, device kept {:02X?}",
                frame.command(),
                params,
                &reply[3..3 + params.len()]
            );
            return Err(Error::ValueMismatch);
        }
        Ok(())
    }

    /// Read a register
    ///
    /// Registers with a two-byte reply payload are decoded as little-endian
    /// 16-bit values, everything else as the single first payload byte.
    pub fn read_register(&mut self, cmd: u8) -> Result<u16> {
        let payload = payload_len(cmd).ok_or(Error::InvalidParameter)?;
        let mut buf = [0u8; MAX_REPLY_LEN];
        let reply = &mut buf[..reply_len(cmd)];
        self.request(cmd, reply)?;

        let value = if payload == 2 {
            u16::from_le_bytes([reply[3], reply[4]])
        } else {
            reply[3] as u16
        };
        log::trace!("pirlink: register 0x{:02X} = 0x{:04X}", cmd, value);
        Ok(value)
    }

    /// Send a zero-parameter command and read a fixed-length reply
    ///
    /// `reply.len()` is the expected frame length. The echoed command is
    /// checked; the caller interprets the payload.
    pub fn request(&mut self, cmd: u8, reply: &mut [u8]) -> Result<()> {
        let frame = CommandFrame::read(cmd);
        let result = self.exchange_read(&frame, reply);
        self.transport.delay_ms(self.config.settle_ms);
        result
    }

    fn exchange_read(&mut self, frame: &CommandFrame, reply: &mut [u8]) -> Result<()> {
        self.send(frame)?;
        self.read_frame(reply, self.config.byte_timeout_ms)?;
        check_echo(frame.command(), reply)
    }

    /// Read one complete frame
    ///
    /// Reads exactly `buf.len()` bytes, waiting up to `timeout_ms` for each
    /// one with 1 ms polling. A missing byte aborts with `Timeout`; whatever
    /// was collected so far is dropped.
    pub fn read_frame(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<()> {
        if buf.len() < FRAME_OVERHEAD {
            return Err(Error::InvalidParameter);
        }

        for (i, slot) in buf.iter_mut().enumerate() {
            let mut waited = 0u64;
            *slot = loop {
                if let Some(byte) = self.transport.read_byte()? {
                    break byte;
                }
                if waited > u64::from(timeout_ms) {
                    log::debug!("pirlink: timeout waiting for reply byte {}", i);
                    return Err(Error::Timeout);
                }
                self.transport.delay_ms(1);
                waited += 1;
            };
        }
        log::trace!("pirlink: rx {:02X?}", buf);

        if is_error_reply(buf) {
            log::debug!("pirlink: device reported unsupported command");
            return Err(Error::Command);
        }
        if !verify_checksum(buf) {
            log::debug!("pirlink: checksum mismatch in {:02X?}", buf);
            return Err(Error::Checksum);
        }
        Ok(())
    }

    /// Search the received stream for a packet starting with `header`
    ///
    /// `packet.len()` is the packet length. The stream is only ever consumed
    /// forward: bytes that turn out not to belong to a valid packet are lost.
    /// Returns `Ok(false)` when not enough bytes are buffered, when noise
    /// before the header proves no complete packet can still be buffered, or
    /// after [`MAX_SYNC_FAILURES`] broken headers/checksums.
    pub fn find_packet(&mut self, header: &[u8], packet: &mut [u8]) -> Result<bool> {
        let packet_len = packet.len();
        if header.is_empty() || header.len() > packet_len || packet_len > MAX_PACKET_LEN {
            return Err(Error::InvalidParameter);
        }

        let buffered = self.transport.available()?;
        if buffered < packet_len {
            return Ok(false);
        }
        let skip_budget = buffered - packet_len;

        let mut scratch = [0u8; MAX_PACKET_LEN];
        let mut failures = 0u8;
        let mut skipped = 0usize;

        'resync: while failures < MAX_SYNC_FAILURES {
            let mut pos = 0;
            while pos < header.len() {
                let byte = match self.transport.read_byte()? {
                    Some(byte) => byte,
                    None => return Ok(false),
                };
                if byte == header[pos] {
                    scratch[pos] = byte;
                    pos += 1;
                } else if pos > 0 {
                    failures += 1;
                    log::trace!("pirlink: header broken at byte {}", pos);
                    continue 'resync;
                } else {
                    skipped += 1;
                    if skipped > skip_budget {
                        return Ok(false);
                    }
                }
            }

            for slot in &mut scratch[header.len()..packet_len] {
                *slot = match self.transport.read_byte()? {
                    Some(byte) => byte,
                    None => return Ok(false),
                };
            }

            if verify_checksum(&scratch[..packet_len]) {
                packet.copy_from_slice(&scratch[..packet_len]);
                return Ok(true);
            }
            failures += 1;
            log::trace!("pirlink: packet checksum mismatch, resyncing");
        }

        log::debug!("pirlink: gave up after {} sync failures", failures);
        Ok(false)
    }

    /// Query whether the sensor output is stable
    pub fn is_stable(&mut self) -> Result<bool> {
        if self.mode == Mode::Auto {
            let mut packet = [0u8; INFO_PACKET_LEN];
            if self.poll_packet(&INFO_PACKET, &mut packet)? {
                return Ok(status_of(&INFO_PACKET, &packet).contains(StatusFlags::STABLE));
            }
            self.enter_command_mode();
        }

        let status = self.read_register(cmd::STATUS)? as u8;
        Ok(StatusFlags::from_bits_retain(status).contains(StatusFlags::STABLE))
    }

    /// Query whether the sensor is currently triggered
    ///
    /// Auto mode reads the status copy in the info packet. Command mode
    /// waits for the trigger-status packet the device sends on its own.
    pub fn is_triggered(&mut self) -> Result<bool> {
        let kind = match self.mode {
            Mode::Auto => INFO_PACKET,
            Mode::Command => TRIGGER_PACKET,
        };

        let mut buf = [0u8; MAX_PACKET_LEN];
        let packet = &mut buf[..kind.len];
        if self.poll_packet(&kind, packet)? {
            return Ok(status_of(&kind, packet).contains(StatusFlags::TRIGGERED));
        }

        if self.mode == Mode::Auto {
            self.enter_command_mode();
        }
        Ok(false)
    }

    /// Check once, without retrying, for a fresh info packet
    ///
    /// On success the packet is cached (see [`Engine::info_packet`]);
    /// otherwise the cache is zeroed.
    pub fn is_info_available(&mut self) -> Result<bool> {
        let mut packet = [0u8; INFO_PACKET_LEN];
        let found = self.find_packet(&INFO_PACKET.header, &mut packet);
        self.info = match found {
            Ok(true) => packet,
            _ => [0; INFO_PACKET_LEN],
        };
        found
    }

    // ---- Protocol implementation ----

    /// Drop stale input, send a frame, give the device time to answer
    fn send(&mut self, frame: &CommandFrame) -> Result<()> {
        self.transport.clear()?;
        log::trace!("pirlink: tx {:02X?}", frame.as_bytes());
        self.transport.write(frame.as_bytes())?;
        self.transport.delay_ms(self.config.reply_wait_ms);
        Ok(())
    }

    /// Run the finder up to `1 + poll_retries` times
    fn poll_packet(&mut self, kind: &PacketKind, packet: &mut [u8]) -> Result<bool> {
        let attempts = self.config.poll_retries as u32 + 1;
        for attempt in 1..=attempts {
            if self.find_packet(&kind.header, packet)? {
                return Ok(true);
            }
            if attempt < attempts {
                self.transport.delay_ms(self.config.poll_interval_ms);
            }
        }
        Ok(false)
    }

    fn enter_command_mode(&mut self) {
        log::warn!("pirlink: no auto-mode packets seen, switching to command mode");
        self.mode = Mode::Command;
    }
}

fn check_echo(cmd: u8, reply: &[u8]) -> Result<()> {
    if reply[1] != cmd {
        log::debug!(
            "pirlink: sent command 0x{:02X}, reply echoes 0x{:02X}",
            cmd,
            reply[1]
        );
        return Err(Error::Command);
    }
    Ok(())
}

fn status_of(kind: &PacketKind, packet: &[u8]) -> StatusFlags {
    StatusFlags::from_bits_retain(packet[kind.status_offset])
}
