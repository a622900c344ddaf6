//! pirlink - Command line tool for BM22S402x PIR sensors
//!
//! Talks to a BM22S402x motion/temperature module over a serial port, a
//! serial-to-TCP bridge, or a simulated device. Every subcommand opens the
//! link, performs one operation and exits; `watch` and `wait-stable` keep
//! polling until they are done.

mod cli;
mod commands;
mod links;

use clap::Parser;
use cli::{Cli, Commands};
use pirlink_core::{Bm22s402, LinkConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    if let Commands::ListLinks = cli.command {
        commands::list_links();
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => LinkConfig::load(path)?,
        None => LinkConfig::default(),
    };

    let transport = links::open_link(&cli.link, &config)?;
    let mut sensor = Bm22s402::with_config(transport, config);

    match cli.command {
        Commands::Id => commands::info::run_id(&mut sensor),
        Commands::Temp { fahrenheit } => commands::info::run_temp(&mut sensor, fahrenheit),
        Commands::Pir { raw } => commands::info::run_pir(&mut sensor, raw),
        Commands::Status => commands::info::run_status(&mut sensor),
        Commands::Sensitivity { set } => commands::settings::run_sensitivity(&mut sensor, set),
        Commands::Enable => commands::settings::run_enable(&mut sensor, true),
        Commands::Disable => commands::settings::run_enable(&mut sensor, false),
        Commands::ConfigParam { set } => commands::settings::run_config_param(&mut sensor, set),
        Commands::Reset => commands::settings::run_reset(&mut sensor),
        Commands::Sleep => commands::settings::run_sleep(&mut sensor),
        Commands::RestoreDefaults => commands::settings::run_restore_defaults(&mut sensor),
        Commands::Watch { count } => commands::watch::run_watch(&mut sensor, count),
        Commands::WaitStable { timeout } => commands::watch::run_wait_stable(&mut sensor, timeout),
        Commands::ListLinks => Ok(()),
    }
}
