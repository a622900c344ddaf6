//! BM22S402x device facade
//!
//! Named sensor operations on top of [`Engine`]. Each one is a single
//! register access or a short sequence of them.

use crate::config::LinkConfig;
use crate::engine::{Engine, Mode};
use crate::error::{Error, Result};
use crate::info::{InfoPacket, Temperature, TemperatureUnit};
use crate::protocol::{
    cmd, reply_len, PirControl, Sensitivity, StatusFlags, FRAME_OVERHEAD, MAX_REPLY_LEN,
    PIR_CONTROL_DEFAULT,
};
use crate::transport::Transport;

/// Length of the device ID
pub const DEVICE_ID_LEN: usize = 10;

/// A BM22S402x PIR sensor module
pub struct Bm22s402<T: Transport> {
    engine: Engine<T>,
}

impl<T: Transport> Bm22s402<T> {
    /// Attach to a sensor with the default link timings
    pub fn new(transport: T) -> Self {
        Self {
            engine: Engine::new(transport),
        }
    }

    /// Attach to a sensor with custom link timings
    pub fn with_config(transport: T, config: LinkConfig) -> Self {
        Self {
            engine: Engine::with_config(transport, config),
        }
    }

    /// Access the protocol engine
    pub fn engine(&self) -> &Engine<T> {
        &self.engine
    }

    /// Mutable access to the protocol engine, for raw register access
    pub fn engine_mut(&mut self) -> &mut Engine<T> {
        &mut self.engine
    }

    /// Consume the device and return the transport
    pub fn into_inner(self) -> T {
        self.engine.into_inner()
    }

    /// Current auto/command mode
    pub fn mode(&self) -> Mode {
        self.engine.mode()
    }

    /// Read the 10-byte device ID
    pub fn device_id(&mut self) -> Result<[u8; DEVICE_ID_LEN]> {
        let mut buf = [0u8; MAX_REPLY_LEN];
        let reply = &mut buf[..reply_len(cmd::DEVICE_ID)];
        self.engine.request(cmd::DEVICE_ID, reply)?;

        let mut id = [0u8; DEVICE_ID_LEN];
        id.copy_from_slice(&reply[3..3 + DEVICE_ID_LEN]);
        Ok(id)
    }

    /// Read the raw PIR ADC value
    pub fn read_raw_pir(&mut self) -> Result<i16> {
        Ok(self.engine.read_register(cmd::RAW_PIR)? as i16)
    }

    /// Read the filtered PIR value
    pub fn read_pir(&mut self) -> Result<u16> {
        self.engine.read_register(cmd::PIR)
    }

    /// Read the temperature
    pub fn temperature(&mut self) -> Result<Temperature> {
        Ok(Temperature(self.engine.read_register(cmd::TEMPERATURE)?))
    }

    /// Read the temperature in the requested unit
    pub fn read_temperature(&mut self, unit: TemperatureUnit) -> Result<f32> {
        Ok(self.temperature()?.to_unit(unit))
    }

    /// Read the status register
    pub fn status(&mut self) -> Result<StatusFlags> {
        let status = self.engine.read_register(cmd::STATUS)?;
        Ok(StatusFlags::from_bits_retain(status as u8))
    }

    /// Read the PIR control register
    pub fn pir_control(&mut self) -> Result<PirControl> {
        let reg = self.engine.read_register(cmd::READ_PIR_CONTROL)?;
        Ok(PirControl::from_bits_retain(reg as u8))
    }

    /// Write the PIR control register
    pub fn set_pir_control(&mut self, control: PirControl) -> Result<()> {
        self.engine
            .write_register(cmd::WRITE_PIR_CONTROL, control.bits() as u16)
    }

    /// Enable or disable PIR detection, leaving the other control bits alone
    pub fn enable_pir(&mut self, enable: bool) -> Result<()> {
        let mut control = self.pir_control()?;
        control.set(PirControl::ENABLE, enable);
        self.set_pir_control(control)
    }

    /// Read the trigger sensitivity
    pub fn sensitivity(&mut self) -> Result<Sensitivity> {
        let level = self.engine.read_register(cmd::READ_SENSITIVITY)?;
        Sensitivity::from_level(level as u8).ok_or_else(|| {
            log::debug!("pirlink: device reports sensitivity level {}", level);
            Error::Command
        })
    }

    /// Set the trigger sensitivity
    pub fn set_sensitivity(&mut self, level: Sensitivity) -> Result<()> {
        self.engine
            .write_register(cmd::WRITE_SENSITIVITY, level.level() as u16)
    }

    /// Read the 16-bit configuration parameter
    pub fn config_param(&mut self) -> Result<u16> {
        self.engine.read_register(cmd::READ_CONFIG)
    }

    /// Write the 16-bit configuration parameter
    pub fn set_config_param(&mut self, value: u16) -> Result<()> {
        self.engine.write_register(cmd::WRITE_CONFIG, value)
    }

    /// Read the reserved register
    pub fn reserved(&mut self) -> Result<u8> {
        Ok(self.engine.read_register(cmd::READ_RESERVED)? as u8)
    }

    /// Write the reserved register
    pub fn set_reserved(&mut self, value: u8) -> Result<()> {
        self.engine.write_register(cmd::WRITE_RESERVED, value as u16)
    }

    /// Software reset; waits for the module to come back up
    pub fn reset(&mut self) -> Result<()> {
        self.acknowledged(cmd::RESET)?;
        log::debug!("pirlink: reset acknowledged");
        let wait = self.engine.config().reset_settle_ms;
        self.engine.delay_ms(wait);
        Ok(())
    }

    /// Put the module to sleep
    pub fn sleep(&mut self) -> Result<()> {
        self.acknowledged(cmd::SLEEP)?;
        log::debug!("pirlink: sleep acknowledged");
        let wait = self.engine.config().sleep_settle_ms;
        self.engine.delay_ms(wait);
        Ok(())
    }

    /// Restore PIR control and sensitivity to factory values
    pub fn restore_default(&mut self) -> Result<()> {
        self.engine
            .write_register(cmd::WRITE_PIR_CONTROL, PIR_CONTROL_DEFAULT as u16)?;
        self.set_sensitivity(Sensitivity::L1)
    }

    /// Whether the sensor output has stabilized
    pub fn is_stable(&mut self) -> Result<bool> {
        self.engine.is_stable()
    }

    /// Whether the sensor is currently triggered
    pub fn is_triggered(&mut self) -> Result<bool> {
        self.engine.is_triggered()
    }

    /// Check once for a new auto-mode info packet
    pub fn is_info_available(&mut self) -> Result<bool> {
        self.engine.is_info_available()
    }

    /// Last captured info packet
    pub fn info(&self) -> InfoPacket {
        InfoPacket::from_bytes(*self.engine.info_packet())
    }

    /// The seven data bytes of the last info packet
    pub fn read_info_packet(&self) -> [u8; 7] {
        self.info().data()
    }

    /// Reset and sleep answer with a bare 4-byte acknowledgement
    fn acknowledged(&mut self, command: u8) -> Result<()> {
        let mut ack = [0u8; FRAME_OVERHEAD];
        self.engine.request(command, &mut ack)
    }
}
