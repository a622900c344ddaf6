//! Long-running monitoring commands

use super::CmdResult;
use indicatif::{ProgressBar, ProgressStyle};
use pirlink_core::{Bm22s402, Mode, StatusFlags, Transport};
use std::time::Duration;

/// Time between stability checks
const STABLE_POLL_MS: u32 = 500;

/// Warn once after this long without an info packet
const QUIET_WARN_MS: u32 = 3000;

/// Print auto-mode info packets as they arrive
pub fn run_watch<T: Transport>(sensor: &mut Bm22s402<T>, count: Option<u32>) -> CmdResult {
    let interval = sensor.engine().config().poll_interval_ms.max(1);
    let mut seen = 0u32;
    let mut quiet_ms = 0u32;
    let mut warned = false;

    println!(
        "{:>8} {:>8} {:>8} {:>9} {:>6}",
        "raw", "pir", "temp", "triggered", "stable"
    );

    while count.is_none_or(|n| seen < n) {
        if sensor.is_info_available()? {
            let info = sensor.info();
            let status = info.status();
            println!(
                "{:>8} {:>8} {:>8.1} {:>9} {:>6}",
                info.raw_pir(),
                info.pir(),
                info.temperature().celsius(),
                status.contains(StatusFlags::TRIGGERED),
                status.contains(StatusFlags::STABLE)
            );
            seen += 1;
            quiet_ms = 0;
            continue;
        }

        sensor.engine_mut().delay_ms(interval);
        quiet_ms = quiet_ms.saturating_add(interval);
        if quiet_ms >= QUIET_WARN_MS && !warned {
            log::warn!("No info packets received yet; is the module in auto mode?");
            warned = true;
        }
    }

    Ok(())
}

/// Poll until the sensor reports a stable output
pub fn run_wait_stable<T: Transport>(sensor: &mut Bm22s402<T>, timeout_s: u64) -> CmdResult {
    let attempts = (timeout_s * 1000 / STABLE_POLL_MS as u64).max(1);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Waiting for sensor to stabilize...");

    for _ in 0..attempts {
        if sensor.is_stable()? {
            pb.finish_with_message("Sensor output is stable");
            return Ok(());
        }
        if sensor.mode() == Mode::Command {
            pb.set_message("Waiting for sensor to stabilize (command mode)...");
        }
        sensor.engine_mut().delay_ms(STABLE_POLL_MS);
    }

    pb.abandon_with_message("Timed out");
    Err(format!("Sensor did not stabilize within {} s", timeout_s).into())
}
