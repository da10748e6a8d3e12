use std::sync::Arc;
use futures::channel::mpsc::Receiver;
use futures::{SinkExt, StreamExt};
use log::{error, info, warn};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::audio::pactl::PactlMicrophone;
use crate::audio::MicrophoneControl;
use crate::cli::{Cli, Command};
use crate::config::io::ConfigIO;
use crate::config::types::Config;
use crate::device::color::cycle_colors;
use crate::device::connection::ButtonSession;
use crate::device::locator::{DeviceLocator, HidLocator};
use crate::error::{readable_thread_panic_error, AppRunError, ConfigError};
use crate::ui::channel::{ui_channel, UI_CHANNEL_CAPACITY};
use crate::ui::types::{InboundUiMessage, OutboundUiMessage, UiEnvelope};

/**
 * How long (milliseconds) the session gets to switch the LED off after ShuttingDown was sent.
 */
const SHUTDOWN_GRACE: u64 = 300;

pub fn run_application(cli: Cli) -> Result<(), AppRunError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|source| AppRunError::Runtime { source })?;

    runtime.block_on(async move {
        match cli.command.unwrap_or(Command::Run) {
            Command::Run => run_session(&cli).await,
            Command::CycleColors => run_cycle_colors().await,
        }
    })
}

async fn load_config(cli: &Cli) -> Result<(ConfigIO, Config), ConfigError> {
    let config_io = match &cli.config {
        Some(path) => ConfigIO::open(path)?,
        None => ConfigIO::new_sync()?,
    };

    let mut config = config_io.read().await?;

    if let Some(color) = &cli.muted_color {
        config.muted_color = color.clone();
    }
    if let Some(color) = &cli.unmuted_color {
        config.unmuted_color = color.clone();
    }

    Ok((config_io, config))
}

async fn run_session(cli: &Cli) -> Result<(), AppRunError> {
    let (config_io, config) = load_config(cli).await?;

    // held until we exit so that a second instance can not grab the button
    let mut locker = config_io.locker()?;
    let _instance_lock = locker.lock()?;

    let colors = config.color_assignment()?;
    let locator: Arc<dyn DeviceLocator> = Arc::new(HidLocator::new()?);
    let microphone: Arc<dyn MicrophoneControl> = Arc::new(PactlMicrophone::new(cli.source.clone()));

    let (button_endpoint, ui_endpoint) = ui_channel(UI_CHANNEL_CAPACITY);
    let cancel = CancellationToken::new();

    let session = ButtonSession::new(locator, microphone, button_endpoint, colors, config.timings());
    let session_handle = tokio::spawn(session.monitor(cancel.clone()));
    let console_handle = tokio::spawn(console_ui_task(ui_endpoint.notifications, cancel.clone()));
    let mut requests = ui_endpoint.requests;

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for Ctrl-C: {}", err);
    }
    info!("Close requested");

    if let Err(err) = requests.send(UiEnvelope::from(InboundUiMessage::ShuttingDown)).await {
        warn!("Failed to send ShuttingDown to button: {}", err);
    }
    sleep(Duration::from_millis(SHUTDOWN_GRACE)).await;
    cancel.cancel();

    for (name, handle) in [("button session", session_handle), ("console UI", console_handle)] {
        if let Err(err) = handle.await {
            if err.is_panic() {
                error!("The {} failed: {}", name, readable_thread_panic_error(&err.into_panic()));
            } else {
                warn!("The {} was not joined: {}", name, err);
            }
        }
    }

    Ok(())
}

async fn run_cycle_colors() -> Result<(), AppRunError> {
    let locator = HidLocator::new()?;
    let cancel = CancellationToken::new();

    let cycle_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cycle_cancel.cancel();
        }
    });

    cycle_colors(&locator, &cancel).await?;
    Ok(())
}

// Stands in for a graphical UI: reports everything the button tells it.
async fn console_ui_task(mut notifications: Receiver<OutboundUiMessage>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            message = notifications.next() => match message {
                Some(OutboundUiMessage::Connected) => info!("Button connected"),
                Some(OutboundUiMessage::Disconnected) => info!("Button disconnected"),
                Some(OutboundUiMessage::Muted) => info!("Microphone muted"),
                Some(OutboundUiMessage::Unmuted) => info!("Microphone unmuted"),
                None => break,
            },
        }
    }
}
