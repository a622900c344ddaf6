//! BM22S402x wire protocol constants and frame construction
//!
//! Every frame on the link, in either direction, has the same shape:
//!
//! ```text
//! [SYNC 0xFB][CMD][LEN][payload ...][CHECKSUM]
//! ```
//!
//! The checksum is the low byte of the sum of everything between the sync
//! byte and the checksum byte itself.

use crate::error::{Error, Result};
use bitflags::bitflags;

/// Frame sync byte
pub const SYNC: u8 = 0xFB;

/// Reply sent by the device for any command it does not support
pub const ERROR_REPLY: [u8; 4] = [SYNC, 0xAB, 0x00, 0xAB];

/// Bytes in a frame that are not payload (sync, command, length, checksum)
pub const FRAME_OVERHEAD: usize = 4;

/// Longest command frame the host ever sends (two-byte write)
pub const MAX_COMMAND_LEN: usize = 6;

/// Longest reply frame the device ever sends (device ID)
pub const MAX_REPLY_LEN: usize = 14;

/// Default link speed
pub const BAUD_RATE: u32 = 38400;

/// Command opcodes
pub mod cmd {
    /// Read raw PIR ADC value (signed 16-bit)
    pub const RAW_PIR: u8 = 0x01;
    /// Read filtered PIR value (unsigned 16-bit)
    pub const PIR: u8 = 0x02;
    /// Read the 10-byte device ID
    pub const DEVICE_ID: u8 = 0x03;
    /// Read PIR control register
    pub const READ_PIR_CONTROL: u8 = 0x04;
    /// Write PIR control register
    pub const WRITE_PIR_CONTROL: u8 = 0x05;
    /// Read sensitivity level
    pub const READ_SENSITIVITY: u8 = 0x06;
    /// Write sensitivity level
    pub const WRITE_SENSITIVITY: u8 = 0x07;
    /// Read 16-bit configuration parameter
    pub const READ_CONFIG: u8 = 0x08;
    /// Write 16-bit configuration parameter
    pub const WRITE_CONFIG: u8 = 0x09;
    /// Read reserved register
    pub const READ_RESERVED: u8 = 0x0A;
    /// Write reserved register
    pub const WRITE_RESERVED: u8 = 0x0B;
    /// Read status register
    pub const STATUS: u8 = 0x0C;
    /// Enter sleep mode
    pub const SLEEP: u8 = 0x0D;
    /// Software reset
    pub const RESET: u8 = 0x0F;
    /// Read temperature (0.1 degC units)
    pub const TEMPERATURE: u8 = 0x10;
}

/// Reply payload length per command, indexed by opcode. Zero means the
/// opcode is unknown.
const REPLY_PAYLOAD: [u8; 0x11] = [
    0,  // 0x00
    2,  // 0x01 raw PIR
    2,  // 0x02 filtered PIR
    10, // 0x03 device ID
    1,  // 0x04
    1,  // 0x05
    1,  // 0x06
    1,  // 0x07
    2,  // 0x08
    2,  // 0x09
    1,  // 0x0A
    1,  // 0x0B
    1,  // 0x0C status
    1,  // 0x0D sleep
    0,  // 0x0E
    1,  // 0x0F reset
    2,  // 0x10 temperature
];

/// Reply payload length for a command, or `None` for unknown opcodes
pub const fn payload_len(cmd: u8) -> Option<usize> {
    let idx = cmd as usize;
    if idx >= REPLY_PAYLOAD.len() || REPLY_PAYLOAD[idx] == 0 {
        None
    } else {
        Some(REPLY_PAYLOAD[idx] as usize)
    }
}

/// Total reply frame length for a command
///
/// Unknown opcodes map to a bare 4-byte frame, which is also the length of
/// the error reply.
pub const fn reply_len(cmd: u8) -> usize {
    match payload_len(cmd) {
        Some(len) => len + FRAME_OVERHEAD,
        None => FRAME_OVERHEAD,
    }
}

/// 8-bit truncated sum of `bytes`
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Check the trailing checksum byte of a complete frame
pub fn verify_checksum(frame: &[u8]) -> bool {
    match frame.len() {
        0 | 1 => false,
        len => checksum(&frame[1..len - 1]) == frame[len - 1],
    }
}

/// Whether the first four bytes of `frame` are the device's error reply
pub fn is_error_reply(frame: &[u8]) -> bool {
    frame.len() >= ERROR_REPLY.len() && frame[..ERROR_REPLY.len()] == ERROR_REPLY
}

/// An outgoing command frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: [u8; MAX_COMMAND_LEN],
    len: usize,
}

impl CommandFrame {
    fn finish(bytes: [u8; MAX_COMMAND_LEN], body_len: usize) -> Self {
        let mut bytes = bytes;
        bytes[body_len] = checksum(&bytes[1..body_len]);
        Self {
            bytes,
            len: body_len + 1,
        }
    }

    /// Build a zero-parameter frame: `{0xFB, cmd, 0x00, checksum}`
    pub fn read(cmd: u8) -> Self {
        Self::finish([SYNC, cmd, 0x00, 0, 0, 0], 3)
    }

    /// Build a write frame
    ///
    /// Only [`cmd::WRITE_CONFIG`] carries two parameter bytes. Every other
    /// register is 8 bits wide, so a `param` above `0xFF` is rejected rather
    /// than silently truncated.
    pub fn write(cmd: u8, param: u16) -> Result<Self> {
        let [low, high] = param.to_le_bytes();
        if cmd == cmd::WRITE_CONFIG {
            Ok(Self::finish([SYNC, cmd, 0x02, low, high, 0], 5))
        } else if high == 0 {
            Ok(Self::finish([SYNC, cmd, 0x01, low, 0, 0], 4))
        } else {
            log::debug!(
                "pirlink: parameter 0x{:04X} does not fit 8-bit register 0x{:02X}",
                param,
                cmd
            );
            Err(Error::InvalidParameter)
        }
    }

    /// Opcode carried by this frame
    pub fn command(&self) -> u8 {
        self.bytes[1]
    }

    /// Parameter bytes carried by this frame
    pub fn params(&self) -> &[u8] {
        &self.bytes[3..self.len - 1]
    }

    /// Raw frame bytes, checksum included
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Frame length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// Frames always hold at least sync, command, length and checksum
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// An unsolicited packet the device emits on its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketKind {
    /// Fixed leading bytes identifying the packet
    pub header: [u8; 3],
    /// Total packet length, checksum included
    pub len: usize,
    /// Offset of the status register copy inside the packet
    pub status_offset: usize,
}

/// Length of the auto-mode info packet
pub const INFO_PACKET_LEN: usize = 11;

/// Info packet streamed in auto mode: raw PIR, filtered PIR, status,
/// temperature
pub const INFO_PACKET: PacketKind = PacketKind {
    header: [SYNC, 0x55, 0x07],
    len: INFO_PACKET_LEN,
    status_offset: 7,
};

/// Trigger-status packet emitted in command mode; same layout as a status
/// register reply
pub const TRIGGER_PACKET: PacketKind = PacketKind {
    header: [SYNC, cmd::STATUS, 0x01],
    len: 5,
    status_offset: 3,
};

/// Longest packet the finder is ever asked to locate
pub const MAX_PACKET_LEN: usize = MAX_REPLY_LEN;

bitflags! {
    /// Status register (0x0C) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusFlags: u8 {
        /// Motion detected
        const TRIGGERED = 0x01;
        /// Sensor has warmed up and output is stable
        const STABLE    = 0x20;
    }
}

bitflags! {
    /// PIR control register (0x04/0x05) bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PirControl: u8 {
        /// PIR detection enabled
        const ENABLE = 0x08;
    }
}

/// Factory value of the PIR control register
pub const PIR_CONTROL_DEFAULT: u8 = 0x6B;

/// PIR trigger level, L1 being the most sensitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Sensitivity {
    /// Highest sensitivity (factory default)
    #[default]
    L1 = 0,
    L2 = 1,
    L3 = 2,
    L4 = 3,
    L5 = 4,
    L6 = 5,
    L7 = 6,
    /// Lowest sensitivity
    L8 = 7,
}

impl Sensitivity {
    /// Decode a register value (0..=7)
    pub fn from_level(level: u8) -> Option<Self> {
        Some(match level {
            0 => Self::L1,
            1 => Self::L2,
            2 => Self::L3,
            3 => Self::L4,
            4 => Self::L5,
            5 => Self::L6,
            6 => Self::L7,
            7 => Self::L8,
            _ => return None,
        })
    }

    /// Register value (0..=7)
    pub fn level(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_frame_layout() {
        let frame = CommandFrame::read(cmd::TEMPERATURE);
        assert_eq!(frame.as_bytes(), &[0xFB, 0x10, 0x00, 0x10]);
        assert!(frame.params().is_empty());

        let frame = CommandFrame::read(cmd::DEVICE_ID);
        assert_eq!(frame.as_bytes(), &[0xFB, 0x03, 0x00, 0x03]);
    }

    #[test]
    fn test_write_frame_layout() {
        let frame = CommandFrame::write(cmd::WRITE_SENSITIVITY, 2).unwrap();
        assert_eq!(frame.as_bytes(), &[0xFB, 0x07, 0x01, 0x02, 0x0A]);
        assert_eq!(frame.params(), &[0x02]);

        let frame = CommandFrame::write(cmd::WRITE_CONFIG, 0x1234).unwrap();
        assert_eq!(frame.as_bytes(), &[0xFB, 0x09, 0x02, 0x34, 0x12, 0x51]);
        assert_eq!(frame.params(), &[0x34, 0x12]);
    }

    #[test]
    fn test_write_frame_rejects_wide_param() {
        assert_eq!(
            CommandFrame::write(cmd::WRITE_SENSITIVITY, 0x100),
            Err(Error::InvalidParameter)
        );
        // The 16-bit register takes the full range
        assert!(CommandFrame::write(cmd::WRITE_CONFIG, 0xFFFF).is_ok());
    }

    #[test]
    fn test_checksum_wraps() {
        let frame = CommandFrame::write(cmd::WRITE_PIR_CONTROL, 0xFF).unwrap();
        // 0x05 + 0x01 + 0xFF = 0x105
        assert_eq!(frame.as_bytes()[4], 0x05);
        assert!(verify_checksum(frame.as_bytes()));
    }

    #[test]
    fn test_reply_lengths() {
        assert_eq!(reply_len(cmd::RAW_PIR), 6);
        assert_eq!(reply_len(cmd::DEVICE_ID), 14);
        assert_eq!(reply_len(cmd::STATUS), 5);
        assert_eq!(reply_len(cmd::TEMPERATURE), 6);
        assert_eq!(payload_len(0x0E), None);
        assert_eq!(payload_len(0x42), None);
        assert_eq!(reply_len(0x42), 4);
    }

    #[test]
    fn test_error_reply_detection() {
        assert!(is_error_reply(&[0xFB, 0xAB, 0x00, 0xAB, 0x00, 0x00]));
        assert!(!is_error_reply(&[0xFB, 0xAB, 0x00]));
        assert!(!is_error_reply(&[0xFB, 0x10, 0x02, 0x64, 0x00, 0x76]));
    }

    #[test]
    fn test_sensitivity_levels() {
        assert_eq!(Sensitivity::from_level(2), Some(Sensitivity::L3));
        assert_eq!(Sensitivity::from_level(8), None);
        assert_eq!(Sensitivity::L8.level(), 7);
        assert_eq!(Sensitivity::default(), Sensitivity::L1);
    }
}
