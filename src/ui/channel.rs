use futures::channel::mpsc::{channel, Receiver, SendError, Sender};
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::ui::types::{InboundUiMessage, OutboundUiMessage, UiEnvelope};

pub const UI_CHANNEL_CAPACITY: usize = 64;

/// The button's side of the UI channel.
pub struct ButtonEndpoint {
    pub notifier: UiNotifier,
    pub requests: Receiver<UiEnvelope>,
}

/// The UI's side of the UI channel.
pub struct UiEndpoint {
    pub requests: Sender<UiEnvelope>,
    pub notifications: Receiver<OutboundUiMessage>,
}

impl UiEndpoint {
    pub async fn send(&mut self, message: InboundUiMessage) -> Result<(), SendError> {
        self.requests.send(UiEnvelope::from(message)).await
    }
}

pub fn ui_channel(capacity: usize) -> (ButtonEndpoint, UiEndpoint) {
    let (notification_tx, notification_rx) = channel::<OutboundUiMessage>(capacity);
    let (request_tx, request_rx) = channel::<UiEnvelope>(capacity);

    let button = ButtonEndpoint {
        notifier: UiNotifier { sender: notification_tx },
        requests: request_rx,
    };
    let ui = UiEndpoint {
        requests: request_tx,
        notifications: notification_rx,
    };

    (button, ui)
}

/// Sends notifications to the UI without ever blocking the caller; failed sends are logged.
#[derive(Clone)]
pub struct UiNotifier {
    sender: Sender<OutboundUiMessage>,
}

impl UiNotifier {
    pub fn send_to_ui(&mut self, message: OutboundUiMessage) {
        if let Err(err) = self.sender.try_send(message) {
            if err.is_disconnected() {
                debug!("UI is gone, dropping {:?}", message);
            } else {
                warn!("Failed to send {:?} to UI: {}", message, err);
            }
        }
    }
}

/// Wait for the next UI request. Returns `None` on cancellation or when the UI hung up.
pub async fn receive_from_ui(requests: &mut Receiver<UiEnvelope>, cancel: &CancellationToken) -> Option<UiEnvelope> {
    tokio::select! {
        _ = cancel.cancelled() => None,
        envelope = requests.next() => envelope,
    }
}
