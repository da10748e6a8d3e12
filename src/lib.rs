use std::env;
use log::LevelFilter;

use crate::app::run_application;
use crate::cli::Cli;
use crate::error::AppRunError;

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod ui;

fn log_level() -> LevelFilter {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info)
}

pub fn init_logging() {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level())
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        match fern::log_file(&log_file) {
            Ok(file) => dispatch = dispatch.chain(file),
            Err(err) => eprintln!("Failed to open LOG_FILE {}: {}", log_file, err),
        }
    }

    if let Err(err) = dispatch.apply() {
        eprintln!("Failed to initialize logger: {}", err);
    }
}

pub fn run(cli: Cli) -> Result<(), AppRunError> {
    run_application(cli)?;
    Ok(())
}
