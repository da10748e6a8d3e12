use futures::channel::mpsc::Receiver;
use log::{error, info, warn};
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;

use crate::device::connection::{SessionState, SharedState};
use crate::device::types::{Color, Mode};
use crate::error::UiMessageError;
use crate::ui::channel::receive_from_ui;
use crate::ui::types::{InboundUiMessage, UiEnvelope};

/// Apply UI requests to the session until cancelled or the UI hangs up.
///
/// Bad color names are logged and dropped. A message type outside the closed set means the
/// producer is broken, so it ends the listener with an error.
pub async fn ui_listener_task(state: SharedState, mut requests: Receiver<UiEnvelope>, cancel: CancellationToken) -> Result<(), UiMessageError> {
    info!("Listening for UI requests");

    while let Some(envelope) = receive_from_ui(&mut requests, &cancel).await {
        let message = InboundUiMessage::try_from(envelope).map_err(|err| {
            error!("Error in UI listener loop: {}", err);
            err
        })?;

        // the read loop holds the lock for up to a read timeout, so wait for it off the runtime
        let state = state.clone();
        if let Err(err) = spawn_blocking(move || handle_ui_message(&mut state.lock(), message)).await {
            error!("Failed to apply UI request: {}", err);
        }
    }

    info!("Stopped listening for UI requests");
    Ok(())
}

pub fn handle_ui_message(state: &mut SessionState, message: InboundUiMessage) {
    match message {
        InboundUiMessage::MuteColor(name) => {
            info!("Received MuteColor request: {}", name);
            match name.parse::<Color>() {
                Ok(color) => {
                    state.colors.set_muted_color(color);
                    state.refresh_colors();
                },
                Err(err) => warn!("Ignoring MuteColor request: {}", err),
            }
        },
        InboundUiMessage::UnmuteColor(name) => {
            info!("Received UnmuteColor request: {}", name);
            match name.parse::<Color>() {
                Ok(color) => {
                    state.colors.set_unmuted_color(color);
                    state.refresh_colors();
                },
                Err(err) => warn!("Ignoring UnmuteColor request: {}", err),
            }
        },
        InboundUiMessage::Mode(name) => {
            // TODO: apply the requested brightness once the UI offers a mode per mute state
            match name.parse::<Mode>() {
                Ok(mode) => info!("Received Mode request: {}", mode),
                Err(err) => warn!("Ignoring Mode request: {}", err),
            }
        },
        InboundUiMessage::ShuttingDown => {
            info!("Received ShuttingDown request");
            state.colors.turn_off();
            state.refresh_colors();
        },
    }
}
