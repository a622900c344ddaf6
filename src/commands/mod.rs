//! CLI command implementations
//!
//! Every command works on a [`pirlink_core::Bm22s402`] over any transport,
//! so the same code drives real hardware and the simulated sensor.

pub mod info;
mod list;
pub mod settings;
pub mod watch;

pub use list::list_links;

/// Result type shared by all commands
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;
