//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u16
fn parse_hex_u16(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u16>().map_err(|e| format!("Invalid number: {}", e))
    }
}

const LINK_HELP: &str = "Link to the sensor: dummy[:auto=1], \
    serial:dev=<port>[:baud] or tcp:ip=<host:port>";

#[derive(Parser)]
#[command(name = "pirlink")]
#[command(author, version, about = "BM22S402x PIR sensor tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Link timing configuration file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Link to the sensor
    #[arg(short, long, global = true, default_value = "dummy", help = LINK_HELP)]
    pub link: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the device ID
    Id,

    /// Read the temperature
    Temp {
        /// Report degrees Fahrenheit instead of Celsius
        #[arg(short, long)]
        fahrenheit: bool,
    },

    /// Read the PIR value
    Pir {
        /// Read the raw ADC value instead of the filtered one
        #[arg(long)]
        raw: bool,
    },

    /// Show the status register
    Status,

    /// Show or set the trigger sensitivity
    Sensitivity {
        /// New level, 1 (most sensitive) to 8
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=8))]
        set: Option<u8>,
    },

    /// Enable PIR detection
    Enable,

    /// Disable PIR detection
    Disable,

    /// Show or set the 16-bit configuration parameter
    ConfigParam {
        /// New value (hex or decimal)
        #[arg(long, value_parser = parse_hex_u16)]
        set: Option<u16>,
    },

    /// Software reset
    Reset,

    /// Put the module to sleep
    Sleep,

    /// Restore PIR control and sensitivity to factory values
    RestoreDefaults,

    /// Print auto-mode info packets as they arrive
    Watch {
        /// Stop after this many packets
        #[arg(short = 'n', long)]
        count: Option<u32>,
    },

    /// Wait until the sensor output has stabilized
    WaitStable {
        /// Give up after this many seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// List supported links
    ListLinks,
}
