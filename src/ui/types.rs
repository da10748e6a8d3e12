use serde::{Deserialize, Serialize};

use crate::device::types::{ConnectionState, MuteState};
use crate::error::UiMessageError;

/// Requests from the UI to the button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundUiMessage {
    MuteColor(String),
    UnmuteColor(String),
    Mode(String),
    ShuttingDown,
}

/// Notifications from the button to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundUiMessage {
    Connected,
    Disconnected,
    Muted,
    Unmuted,
}

/// The untyped work item the UI actually puts on the queue. The UI may live in another process,
/// so the message type arrives as a tag and is validated by the listener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiEnvelope {
    pub kind: String,
    #[serde(default)]
    pub data: String,
}

impl UiEnvelope {
    pub fn new(kind: &str, data: &str) -> Self {
        UiEnvelope { kind: kind.to_string(), data: data.to_string() }
    }
}

impl TryFrom<UiEnvelope> for InboundUiMessage {
    type Error = UiMessageError;

    fn try_from(envelope: UiEnvelope) -> Result<Self, Self::Error> {
        match envelope.kind.as_str() {
            "MuteColor" => Ok(InboundUiMessage::MuteColor(envelope.data)),
            "UnmuteColor" => Ok(InboundUiMessage::UnmuteColor(envelope.data)),
            "Mode" => Ok(InboundUiMessage::Mode(envelope.data)),
            "ShuttingDown" => Ok(InboundUiMessage::ShuttingDown),
            _ => Err(UiMessageError::UnsupportedVariant { kind: envelope.kind }),
        }
    }
}

impl From<InboundUiMessage> for UiEnvelope {
    fn from(message: InboundUiMessage) -> Self {
        match message {
            InboundUiMessage::MuteColor(name) => UiEnvelope::new("MuteColor", &name),
            InboundUiMessage::UnmuteColor(name) => UiEnvelope::new("UnmuteColor", &name),
            InboundUiMessage::Mode(name) => UiEnvelope::new("Mode", &name),
            InboundUiMessage::ShuttingDown => UiEnvelope::new("ShuttingDown", ""),
        }
    }
}

impl From<ConnectionState> for OutboundUiMessage {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Connected => OutboundUiMessage::Connected,
            ConnectionState::Disconnected => OutboundUiMessage::Disconnected,
        }
    }
}

impl From<MuteState> for OutboundUiMessage {
    fn from(state: MuteState) -> Self {
        match state {
            MuteState::Muted => OutboundUiMessage::Muted,
            MuteState::Unmuted => OutboundUiMessage::Unmuted,
        }
    }
}
