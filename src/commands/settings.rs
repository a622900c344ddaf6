//! Register writes and device control

use super::CmdResult;
use pirlink_core::{Bm22s402, PirControl, Sensitivity, Transport};

/// Show or change the sensitivity
///
/// Levels are numbered 1-8 on the command line and 0-7 on the wire.
pub fn run_sensitivity<T: Transport>(sensor: &mut Bm22s402<T>, set: Option<u8>) -> CmdResult {
    if let Some(level) = set {
        let level = level
            .checked_sub(1)
            .and_then(Sensitivity::from_level)
            .ok_or_else(|| format!("Invalid sensitivity level: {}", level))?;
        sensor.set_sensitivity(level)?;
        log::info!("Sensitivity set");
    }

    let level = sensor.sensitivity()?;
    println!("Sensitivity: {} of 8", level.level() + 1);
    Ok(())
}

/// Enable or disable PIR detection
pub fn run_enable<T: Transport>(sensor: &mut Bm22s402<T>, enable: bool) -> CmdResult {
    sensor.enable_pir(enable)?;
    let control = sensor.pir_control()?;
    println!(
        "PIR detection {} (control 0x{:02X})",
        if control.contains(PirControl::ENABLE) {
            "enabled"
        } else {
            "disabled"
        },
        control.bits()
    );
    Ok(())
}

/// Show or change the configuration parameter
pub fn run_config_param<T: Transport>(sensor: &mut Bm22s402<T>, set: Option<u16>) -> CmdResult {
    if let Some(value) = set {
        sensor.set_config_param(value)?;
        log::info!("Configuration parameter set");
    }
    println!("Config parameter: 0x{:04X}", sensor.config_param()?);
    Ok(())
}

/// Reset the module
pub fn run_reset<T: Transport>(sensor: &mut Bm22s402<T>) -> CmdResult {
    log::info!("Resetting sensor...");
    sensor.reset()?;
    println!("Reset complete");
    Ok(())
}

/// Put the module to sleep
pub fn run_sleep<T: Transport>(sensor: &mut Bm22s402<T>) -> CmdResult {
    sensor.sleep()?;
    println!("Sensor is asleep");
    Ok(())
}

/// Restore factory PIR control and sensitivity
pub fn run_restore_defaults<T: Transport>(sensor: &mut Bm22s402<T>) -> CmdResult {
    sensor.restore_default()?;
    println!("Factory defaults restored");
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use pirlink_dummy::DummySensor;

    #[test]
    fn test_sensitivity_is_one_based() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        run_sensitivity(&mut sensor, Some(3)).unwrap();
        assert_eq!(sensor.into_inner().sensitivity(), 2);
    }

    #[test]
    fn test_sensitivity_zero_rejected() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        assert!(run_sensitivity(&mut sensor, Some(0)).is_err());
        assert!(sensor.into_inner().received().is_empty());
    }

    #[test]
    fn test_disable_then_restore() {
        let mut sensor = Bm22s402::new(DummySensor::new_default());
        run_enable(&mut sensor, false).unwrap();
        assert_eq!(sensor.pir_control(), Ok(PirControl::from_bits_retain(0x63)));
        run_restore_defaults(&mut sensor).unwrap();
        assert_eq!(sensor.pir_control(), Ok(PirControl::from_bits_retain(0x6B)));
    }
}
