//! pirlink-dummy - Simulated BM22S402x sensor for testing
//!
//! This crate provides a dummy sensor that speaks the module's serial
//! protocol entirely in memory. It implements [`Transport`] directly, so it
//! can be handed to an engine in place of a real serial port. Time is
//! virtual: it only advances through `delay_ms`, which is also when the
//! simulated device emits auto-mode packets.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::collections::VecDeque;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use pirlink_core::error::Result;
use pirlink_core::protocol::{
    checksum, cmd, verify_checksum, Sensitivity, ERROR_REPLY, FRAME_OVERHEAD, INFO_PACKET,
    PIR_CONTROL_DEFAULT, SYNC, TRIGGER_PACKET,
};
use pirlink_core::transport::Transport;

/// Receive FIFO size of the host UART being simulated
pub const RX_FIFO_SIZE: usize = 64;

/// Configuration for the dummy sensor
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device ID returned by command 0x03
    pub device_id: [u8; 10],
    /// Raw PIR ADC reading
    pub raw_pir: i16,
    /// Filtered PIR reading
    pub pir: u16,
    /// Temperature in 0.1 degC
    pub temperature: u16,
    /// Status register
    pub status: u8,
    /// Stream info packets on its own
    pub auto_mode: bool,
    /// Interval between auto-mode info packets
    pub auto_interval_ms: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_id: *b"BM22S402\x01\x00",
            raw_pir: -12,
            pir: 512,
            temperature: 253, // 25.3 degC
            status: 0x20,     // stable, not triggered
            auto_mode: false,
            auto_interval_ms: 100,
        }
    }
}

/// One-shot misbehavior applied to the next reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Flip every bit of the checksum byte
    CorruptChecksum,
    /// Do not answer at all
    DropReply,
    /// Send only the first `n` bytes
    Truncate(usize),
    /// Echo a different command byte (checksum still valid)
    WrongEcho,
    /// Ignore the written value and echo the current one
    RejectWrite,
}

/// Dummy sensor
///
/// Emulates the register file and reply behavior of a BM22S402x module.
#[cfg(feature = "alloc")]
pub struct DummySensor {
    config: DummyConfig,
    pir_control: u8,
    sensitivity: u8,
    config_param: u16,
    reserved: u8,
    status: u8,
    /// Device to host bytes
    rx: VecDeque<u8>,
    /// Host to device bytes of a frame still being received
    pending: Vec<u8>,
    /// Every complete frame the device has received
    received: Vec<Vec<u8>>,
    fault: Option<Fault>,
    asleep: bool,
    now_ms: u64,
    next_emit_ms: u64,
}

#[cfg(feature = "alloc")]
impl DummySensor {
    /// Create a new dummy sensor with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let next_emit_ms = config.auto_interval_ms as u64;
        let status = config.status;
        Self {
            config,
            pir_control: PIR_CONTROL_DEFAULT,
            sensitivity: Sensitivity::L1.level(),
            config_param: 0,
            reserved: 0,
            status,
            rx: VecDeque::new(),
            pending: Vec::new(),
            received: Vec::new(),
            fault: None,
            asleep: false,
            now_ms: 0,
            next_emit_ms,
        }
    }

    /// Create a new dummy sensor with default configuration (command mode)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy sensor that streams info packets
    pub fn new_auto() -> Self {
        Self::new(DummyConfig {
            auto_mode: true,
            ..DummyConfig::default()
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Virtual time elapsed so far
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Every complete frame received from the host, in order
    pub fn received(&self) -> &[Vec<u8>] {
        &self.received
    }

    /// Whether a sleep command has been accepted
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// Wake the module up again
    pub fn wake(&mut self) {
        self.asleep = false;
    }

    /// PIR control register
    pub fn pir_control(&self) -> u8 {
        self.pir_control
    }

    /// Sensitivity register
    pub fn sensitivity(&self) -> u8 {
        self.sensitivity
    }

    /// Configuration parameter register
    pub fn config_param(&self) -> u16 {
        self.config_param
    }

    /// Set the status register
    pub fn set_status(&mut self, status: u8) {
        self.status = status;
    }

    /// Set the temperature reading (0.1 degC)
    pub fn set_temperature(&mut self, temperature: u16) {
        self.config.temperature = temperature;
    }

    /// Start or stop streaming info packets
    pub fn set_auto_mode(&mut self, enabled: bool) {
        self.config.auto_mode = enabled;
        self.next_emit_ms = self.now_ms + self.config.auto_interval_ms as u64;
    }

    /// Misbehave on the next reply
    pub fn inject_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    /// Put arbitrary bytes on the line towards the host
    pub fn inject_noise(&mut self, bytes: &[u8]) {
        self.push_rx(bytes);
    }

    /// Emit one auto-mode info packet now
    pub fn emit_info_packet(&mut self) {
        let [raw_lo, raw_hi] = self.config.raw_pir.to_le_bytes();
        let [pir_lo, pir_hi] = self.config.pir.to_le_bytes();
        let [t_lo, t_hi] = self.config.temperature.to_le_bytes();
        let mut packet = [0u8; INFO_PACKET.len];
        packet[..3].copy_from_slice(&INFO_PACKET.header);
        packet[3..10].copy_from_slice(&[raw_lo, raw_hi, pir_lo, pir_hi, self.status, t_lo, t_hi]);
        packet[10] = checksum(&packet[1..10]);
        self.push_rx(&packet);
    }

    /// Emit one trigger-status packet now
    pub fn emit_trigger_packet(&mut self) {
        let mut packet = [0u8; TRIGGER_PACKET.len];
        packet[..3].copy_from_slice(&TRIGGER_PACKET.header);
        packet[3] = self.status;
        packet[4] = checksum(&packet[1..4]);
        self.push_rx(&packet);
    }

    fn push_rx(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.rx.len() >= RX_FIFO_SIZE {
                log::trace!("dummy: rx FIFO overflow, dropping 0x{:02X}", b);
                continue;
            }
            self.rx.push_back(b);
        }
    }

    fn receive(&mut self, byte: u8) {
        if self.pending.is_empty() && byte != SYNC {
            return;
        }
        self.pending.push(byte);

        if self.pending.len() >= 3 {
            let param_len = self.pending[2] as usize;
            if param_len > 2 {
                log::trace!("dummy: bad length byte {}, dropping frame", param_len);
                self.pending.clear();
                return;
            }
            if self.pending.len() == param_len + FRAME_OVERHEAD {
                let frame = core::mem::take(&mut self.pending);
                self.handle_frame(frame);
            }
        }
    }

    fn handle_frame(&mut self, frame: Vec<u8>) {
        self.received.push(frame.clone());
        if self.asleep {
            return;
        }

        let reply = if verify_checksum(&frame) {
            self.execute(frame[1], &frame[3..frame.len() - 1])
        } else {
            log::trace!("dummy: bad checksum in {:02X?}", frame);
            ERROR_REPLY.to_vec()
        };

        let reply = self.apply_fault(reply);
        self.push_rx(&reply);
    }

    fn execute(&mut self, command: u8, params: &[u8]) -> Vec<u8> {
        let reject = self.fault == Some(Fault::RejectWrite);
        if reject {
            self.fault = None;
        }

        match (command, params) {
            (cmd::RAW_PIR, []) => reply_frame(command, &self.config.raw_pir.to_le_bytes()),
            (cmd::PIR, []) => reply_frame(command, &self.config.pir.to_le_bytes()),
            (cmd::DEVICE_ID, []) => reply_frame(command, &self.config.device_id),
            (cmd::TEMPERATURE, []) => {
                reply_frame(command, &self.config.temperature.to_le_bytes())
            }
            (cmd::STATUS, []) => reply_frame(command, &[self.status]),

            (cmd::READ_PIR_CONTROL, []) => reply_frame(command, &[self.pir_control]),
            (cmd::WRITE_PIR_CONTROL, &[value]) => {
                if !reject {
                    self.pir_control = value;
                }
                reply_frame(command, &[self.pir_control])
            }

            (cmd::READ_SENSITIVITY, []) => reply_frame(command, &[self.sensitivity]),
            (cmd::WRITE_SENSITIVITY, &[value]) => {
                // Out-of-range levels are ignored
                if !reject && Sensitivity::from_level(value).is_some() {
                    self.sensitivity = value;
                }
                reply_frame(command, &[self.sensitivity])
            }

            (cmd::READ_CONFIG, []) => reply_frame(command, &self.config_param.to_le_bytes()),
            (cmd::WRITE_CONFIG, &[low, high]) => {
                if !reject {
                    self.config_param = u16::from_le_bytes([low, high]);
                }
                reply_frame(command, &self.config_param.to_le_bytes())
            }

            (cmd::READ_RESERVED, []) => reply_frame(command, &[self.reserved]),
            (cmd::WRITE_RESERVED, &[value]) => {
                if !reject {
                    self.reserved = value;
                }
                reply_frame(command, &[self.reserved])
            }

            (cmd::SLEEP, []) => {
                self.asleep = true;
                reply_frame(command, &[])
            }
            (cmd::RESET, []) => {
                self.reset_registers();
                reply_frame(command, &[])
            }

            _ => ERROR_REPLY.to_vec(),
        }
    }

    fn reset_registers(&mut self) {
        self.pir_control = PIR_CONTROL_DEFAULT;
        self.sensitivity = Sensitivity::L1.level();
        self.config_param = 0;
        self.reserved = 0;
        self.status = self.config.status;
        self.rx.clear();
    }

    fn apply_fault(&mut self, mut reply: Vec<u8>) -> Vec<u8> {
        match self.fault.take() {
            None | Some(Fault::RejectWrite) => {}
            Some(Fault::CorruptChecksum) => {
                if let Some(last) = reply.last_mut() {
                    *last ^= 0xFF;
                }
            }
            Some(Fault::DropReply) => reply.clear(),
            Some(Fault::Truncate(n)) => reply.truncate(n),
            Some(Fault::WrongEcho) => {
                reply[1] ^= 0x80;
                let len = reply.len();
                reply[len - 1] = checksum(&reply[1..len - 1]);
            }
        }
        reply
    }
}

/// Build `[SYNC, cmd, len, payload..., checksum]`
#[cfg(feature = "alloc")]
fn reply_frame(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    frame.push(SYNC);
    frame.push(command);
    frame.push(payload.len() as u8);
    frame.extend_from_slice(payload);
    frame.push(checksum(&frame[1..]));
    frame
}

#[cfg(feature = "alloc")]
impl Transport for DummySensor {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        for &b in data {
            self.receive(b);
        }
        Ok(())
    }

    fn available(&mut self) -> Result<usize> {
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.rx.pop_front())
    }

    fn delay_ms(&mut self, ms: u32) {
        self.now_ms += ms as u64;
        if !self.config.auto_mode || self.config.auto_interval_ms == 0 {
            return;
        }
        while self.now_ms >= self.next_emit_ms {
            if !self.asleep {
                self.emit_info_packet();
            }
            self.next_emit_ms += self.config.auto_interval_ms as u64;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pirlink_core::engine::Mode;
    use pirlink_core::error::Error;
    use pirlink_core::{Bm22s402, PirControl, StatusFlags, Temperature, TemperatureUnit};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_write_then_read_returns_written_value() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        let engine = sensor.engine_mut();

        let cases: [(u8, u8, u16); 4] = [
            (cmd::WRITE_PIR_CONTROL, cmd::READ_PIR_CONTROL, 0x4B),
            (cmd::WRITE_SENSITIVITY, cmd::READ_SENSITIVITY, 5),
            (cmd::WRITE_CONFIG, cmd::READ_CONFIG, 0xBEEF),
            (cmd::WRITE_RESERVED, cmd::READ_RESERVED, 0x5A),
        ];
        for (write, read, value) in cases {
            assert_eq!(engine.write_register(write, value), Ok(()));
            assert_eq!(engine.read_register(read), Ok(value), "register 0x{:02X}", read);
        }
    }

    #[test]
    fn test_set_sensitivity_frame_on_the_wire() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        assert_eq!(sensor.set_sensitivity(Sensitivity::L3), Ok(()));
        assert_eq!(sensor.sensitivity(), Ok(Sensitivity::L3));

        let dummy = sensor.into_inner();
        assert_eq!(dummy.received()[0], [0xFB, 0x07, 0x01, 0x02, 0x0A]);
        assert_eq!(dummy.sensitivity(), 2);
    }

    #[test]
    fn test_out_of_range_write_is_value_mismatch() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        assert_eq!(
            sensor.engine_mut().write_register(cmd::WRITE_SENSITIVITY, 9),
            Err(Error::ValueMismatch)
        );
        assert_eq!(sensor.sensitivity(), Ok(Sensitivity::L1));
    }

    #[test]
    fn test_rejected_write() {
        let mut dummy = DummySensor::new_default();
        dummy.inject_fault(Fault::RejectWrite);
        let mut sensor = Bm22s402::new(dummy);
        assert_eq!(sensor.set_config_param(0x1234), Err(Error::ValueMismatch));
        assert_eq!(sensor.set_config_param(0x1234), Ok(()));
        assert_eq!(sensor.config_param(), Ok(0x1234));
    }

    #[test]
    fn test_temperature() {
        let mut dummy = DummySensor::new_default();
        dummy.set_temperature(0x0064);
        let mut sensor = Bm22s402::new(dummy);

        assert_eq!(sensor.temperature(), Ok(Temperature(100)));
        let c = sensor.read_temperature(TemperatureUnit::Celsius).unwrap();
        let f = sensor.read_temperature(TemperatureUnit::Fahrenheit).unwrap();
        assert!(approx(c, 10.0));
        assert!(approx(f, 50.0));
    }

    #[test]
    fn test_readings() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        assert_eq!(sensor.device_id(), Ok(*b"BM22S402\x01\x00"));
        assert_eq!(sensor.read_raw_pir(), Ok(-12));
        assert_eq!(sensor.read_pir(), Ok(512));
        assert_eq!(sensor.status(), Ok(StatusFlags::STABLE));
        assert_eq!(sensor.reserved(), Ok(0));
    }

    #[test]
    fn test_unsupported_command() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        let mut reply = [0u8; 4];
        assert_eq!(
            sensor.engine_mut().request(0x0E, &mut reply),
            Err(Error::Command)
        );
    }

    #[test]
    fn test_faults_do_not_poison_the_engine() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());

        sensor.engine_mut().transport_mut().inject_fault(Fault::CorruptChecksum);
        assert_eq!(sensor.read_pir(), Err(Error::Checksum));
        assert_eq!(sensor.read_pir(), Ok(512));

        sensor.engine_mut().transport_mut().inject_fault(Fault::WrongEcho);
        assert_eq!(sensor.read_pir(), Err(Error::Command));

        sensor.engine_mut().transport_mut().inject_fault(Fault::Truncate(3));
        assert_eq!(sensor.read_pir(), Err(Error::Timeout));

        assert_eq!(sensor.read_pir(), Ok(512));
    }

    #[test]
    fn test_dropped_reply_times_out_in_bounded_time() {
        let mut dummy = DummySensor::new_default();
        dummy.inject_fault(Fault::DropReply);
        let mut sensor = Bm22s402::new(dummy);

        assert_eq!(sensor.read_pir(), Err(Error::Timeout));
        // reply wait 10 + byte timeout 11 + settle 10
        assert_eq!(sensor.into_inner().now_ms(), 31);
    }

    #[test]
    fn test_sleep_and_wake() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        assert_eq!(sensor.sleep(), Ok(()));
        assert!(sensor.engine_mut().transport_mut().is_asleep());
        assert_eq!(sensor.read_pir(), Err(Error::Timeout));

        sensor.engine_mut().transport_mut().wake();
        assert_eq!(sensor.read_pir(), Ok(512));
    }

    #[test]
    fn test_reset_restores_registers_and_waits() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        sensor.set_sensitivity(Sensitivity::L6).unwrap();
        let before = sensor.engine_mut().transport_mut().now_ms();

        assert_eq!(sensor.reset(), Ok(()));
        let elapsed = sensor.engine_mut().transport_mut().now_ms() - before;
        assert!(elapsed >= 1000);
        assert_eq!(sensor.sensitivity(), Ok(Sensitivity::L1));
    }

    #[test]
    fn test_restore_default_and_enable_pir() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        sensor.set_pir_control(PirControl::empty()).unwrap();
        sensor.set_sensitivity(Sensitivity::L8).unwrap();

        assert_eq!(sensor.enable_pir(true), Ok(()));
        assert_eq!(sensor.pir_control(), Ok(PirControl::ENABLE));
        assert_eq!(sensor.enable_pir(false), Ok(()));
        assert_eq!(sensor.pir_control(), Ok(PirControl::empty()));

        assert_eq!(sensor.restore_default(), Ok(()));
        let dummy = sensor.into_inner();
        assert_eq!(dummy.pir_control(), PIR_CONTROL_DEFAULT);
        assert_eq!(dummy.sensitivity(), 0);
    }

    #[test]
    fn test_enable_pir_keeps_other_bits() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        assert_eq!(sensor.enable_pir(false), Ok(()));
        assert_eq!(
            sensor.pir_control().map(|c| c.bits()),
            Ok(PIR_CONTROL_DEFAULT & !0x08)
        );
    }

    #[test]
    fn test_auto_mode_stable_through_noise() {
        let mut dummy = DummySensor::new_auto();
        dummy.inject_noise(&[0x00, 0xFB, 0x12]);
        let mut sensor = Bm22s402::new(dummy);

        assert_eq!(sensor.is_stable(), Ok(true));
        assert_eq!(sensor.mode(), Mode::Auto);
        // Answered from the stream, no command sent
        assert!(sensor.into_inner().received().is_empty());
    }

    #[test]
    fn test_auto_mode_info_packet() {
        let mut dummy = DummySensor::new_auto();
        dummy.set_status(0x21);
        dummy.emit_info_packet();
        let mut sensor = Bm22s402::new(dummy);

        assert_eq!(sensor.is_info_available(), Ok(true));
        let info = sensor.info();
        assert_eq!(info.raw_pir(), -12);
        assert_eq!(info.pir(), 512);
        assert_eq!(info.temperature(), Temperature(253));
        assert!(info.status().contains(StatusFlags::TRIGGERED));
        assert_eq!(sensor.read_info_packet()[4], 0x21);

        // Nothing new yet
        assert_eq!(sensor.is_info_available(), Ok(false));
        assert!(sensor.info().is_empty());
    }

    #[test]
    fn test_auto_mode_triggered() {
        let mut dummy = DummySensor::new_auto();
        dummy.set_status(0x01);
        let mut sensor = Bm22s402::new(dummy);
        assert_eq!(sensor.is_triggered(), Ok(true));
    }

    #[test]
    fn test_command_mode_fallback_is_permanent() {
        let mut dummy = DummySensor::new_default();
        dummy.set_status(0x20);
        let mut sensor = Bm22s402::new(dummy);

        assert_eq!(sensor.is_stable(), Ok(true));
        assert_eq!(sensor.mode(), Mode::Command);

        // Even once the device starts streaming, the engine stays put
        sensor.engine_mut().transport_mut().set_auto_mode(true);
        assert_eq!(sensor.is_stable(), Ok(true));
        assert_eq!(sensor.mode(), Mode::Command);
    }

    #[test]
    fn test_command_mode_trigger_packet() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        // First query exhausts the auto-mode poll
        assert_eq!(sensor.is_triggered(), Ok(false));
        assert_eq!(sensor.mode(), Mode::Command);

        let dummy = sensor.engine_mut().transport_mut();
        dummy.set_status(0x21);
        dummy.emit_trigger_packet();
        assert_eq!(sensor.is_triggered(), Ok(true));
    }
}
