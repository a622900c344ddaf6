//! pirlink-core - Protocol core for BM22S402x PIR sensor modules
//!
//! This crate implements the framed serial protocol spoken by BM22S402x
//! motion/temperature sensors. It is `no_std` compatible so the same code
//! runs on the microcontroller that hosts the sensor and on a PC talking to
//! it through a USB-serial adapter.
//!
//! # Features
//!
//! - `std` - Enable standard library support (TOML config loading)
//! - `alloc` - Enable `Transport` for boxed transports
//! - `serde` - Derive serde traits for [`LinkConfig`]
//!
//! # Example
//!
//! ```ignore
//! use pirlink_core::{Bm22s402, TemperatureUnit};
//!
//! fn report<T: pirlink_core::Transport>(sensor: &mut Bm22s402<T>) {
//!     match sensor.read_temperature(TemperatureUnit::Celsius) {
//!         Ok(t) => println!("{:.1} degC", t),
//!         Err(e) => println!("read failed: {}", e),
//!     }
//! }
//! ```

#![no_std]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod info;
pub mod protocol;
pub mod transport;

pub use config::LinkConfig;
pub use device::Bm22s402;
pub use engine::{Engine, Mode};
pub use error::{Error, Result};
pub use info::{InfoPacket, Temperature, TemperatureUnit};
pub use protocol::{PirControl, Sensitivity, StatusFlags};
pub use transport::Transport;
