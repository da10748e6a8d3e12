use clap::Parser;
use log::{error, info};
use muteme_button::cli::Cli;
use muteme_button::error::{AppRunError, ConfigError};
use muteme_button::{init_logging, run};

fn main() -> Result<(), AppRunError> {
    init_logging();
    info!(concat!("MuteMe Button ", env!("CARGO_PKG_VERSION")));

    let cli = Cli::parse();

    match run(cli) {
        Err(AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } }) => {
            error!("This application has already been started");
            Ok(())
        },
        Err(err) => {
            error!("Unexpected error: {}", err);
            Err(err)
        },
        Ok(_) => Ok(())
    }
}
