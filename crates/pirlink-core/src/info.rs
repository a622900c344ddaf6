//! Decoded sensor readings

use crate::protocol::{StatusFlags, INFO_PACKET, INFO_PACKET_LEN};

/// Temperature unit selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemperatureUnit {
    /// Degrees Celsius
    #[default]
    Celsius,
    /// Degrees Fahrenheit
    Fahrenheit,
}

/// Temperature as reported by the sensor, in 0.1 degC steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Temperature(pub u16);

impl Temperature {
    /// Degrees Celsius
    pub fn celsius(self) -> f32 {
        self.0 as f32 / 10.0
    }

    /// Degrees Fahrenheit
    pub fn fahrenheit(self) -> f32 {
        self.celsius() * 9.0 / 5.0 + 32.0
    }

    /// Value in the requested unit
    pub fn to_unit(self, unit: TemperatureUnit) -> f32 {
        match unit {
            TemperatureUnit::Celsius => self.celsius(),
            TemperatureUnit::Fahrenheit => self.fahrenheit(),
        }
    }
}

/// Auto-mode info packet
///
/// Layout after the 3-byte header: raw PIR (i16 LE), filtered PIR (u16 LE),
/// status register, temperature (u16 LE), checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InfoPacket {
    bytes: [u8; INFO_PACKET_LEN],
}

impl InfoPacket {
    /// Wrap a raw packet
    pub fn from_bytes(bytes: [u8; INFO_PACKET_LEN]) -> Self {
        Self { bytes }
    }

    /// Raw packet bytes, header and checksum included
    pub fn as_bytes(&self) -> &[u8; INFO_PACKET_LEN] {
        &self.bytes
    }

    /// The seven data bytes between header and checksum
    pub fn data(&self) -> [u8; 7] {
        let mut data = [0u8; 7];
        data.copy_from_slice(&self.bytes[3..10]);
        data
    }

    /// True when no packet has been captured (all bytes zero)
    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Raw PIR ADC value
    pub fn raw_pir(&self) -> i16 {
        i16::from_le_bytes([self.bytes[3], self.bytes[4]])
    }

    /// Filtered PIR value
    pub fn pir(&self) -> u16 {
        u16::from_le_bytes([self.bytes[5], self.bytes[6]])
    }

    /// Status register copy
    pub fn status(&self) -> StatusFlags {
        StatusFlags::from_bits_retain(self.bytes[INFO_PACKET.status_offset])
    }

    /// Temperature reading
    pub fn temperature(&self) -> Temperature {
        Temperature(u16::from_le_bytes([self.bytes[8], self.bytes[9]]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::checksum;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_temperature_conversion() {
        let t = Temperature(0x0064);
        assert!(approx(t.celsius(), 10.0));
        assert!(approx(t.fahrenheit(), 50.0));
        assert!(approx(t.to_unit(TemperatureUnit::Fahrenheit), 50.0));
        assert!(approx(Temperature(253).celsius(), 25.3));
    }

    #[test]
    fn test_info_packet_fields() {
        let mut bytes = [0xFB, 0x55, 0x07, 0x18, 0xFC, 0x00, 0x02, 0x21, 0xFD, 0x00, 0x00];
        bytes[10] = checksum(&bytes[1..10]);
        let info = InfoPacket::from_bytes(bytes);

        assert_eq!(info.raw_pir(), -1000);
        assert_eq!(info.pir(), 512);
        assert!(info.status().contains(StatusFlags::STABLE | StatusFlags::TRIGGERED));
        assert_eq!(info.temperature(), Temperature(253));
        assert_eq!(info.data(), [0x18, 0xFC, 0x00, 0x02, 0x21, 0xFD, 0x00]);
        assert!(!info.is_empty());
        assert!(InfoPacket::default().is_empty());
    }
}
