//! Read-only sensor queries

use super::CmdResult;
use pirlink_core::{Bm22s402, StatusFlags, TemperatureUnit, Transport};

/// Print the device ID
pub fn run_id<T: Transport>(sensor: &mut Bm22s402<T>) -> CmdResult {
    let id = sensor.device_id()?;
    let hex: Vec<String> = id.iter().map(|b| format!("{:02X}", b)).collect();
    println!("Device ID: {}", hex.join(" "));

    let printable = id
        .iter()
        .take_while(|b| b.is_ascii_graphic())
        .map(|&b| b as char)
        .collect::<String>();
    if !printable.is_empty() {
        println!("Model:     {}", printable);
    }
    Ok(())
}

/// Print the temperature
pub fn run_temp<T: Transport>(sensor: &mut Bm22s402<T>, fahrenheit: bool) -> CmdResult {
    let (unit, suffix) = if fahrenheit {
        (TemperatureUnit::Fahrenheit, "degF")
    } else {
        (TemperatureUnit::Celsius, "degC")
    };
    let value = sensor.read_temperature(unit)?;
    println!("{:.1} {}", value, suffix);
    Ok(())
}

/// Print the PIR reading
pub fn run_pir<T: Transport>(sensor: &mut Bm22s402<T>, raw: bool) -> CmdResult {
    if raw {
        println!("Raw PIR: {}", sensor.read_raw_pir()?);
    } else {
        println!("PIR: {}", sensor.read_pir()?);
    }
    Ok(())
}

/// Print the status register
pub fn run_status<T: Transport>(sensor: &mut Bm22s402<T>) -> CmdResult {
    let status = sensor.status()?;
    println!("Status:    0x{:02X}", status.bits());
    println!("Stable:    {}", yes_no(status.contains(StatusFlags::STABLE)));
    println!("Triggered: {}", yes_no(status.contains(StatusFlags::TRIGGERED)));
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
