use std::fmt;
use std::str::FromStr;

use crate::device::constants::COMMAND_REPORT_ID;
use crate::error::{ColorParseError, ModeParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Remembers the last observed connection state so that repeated observations of the same state
/// produce a single edge.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    // None until the first observation, so the very first state always produces an edge
    current: Option<ConnectionState>,
}

impl ConnectionTracker {
    /// Record `new_state`, returning it only if it differs from the previous observation.
    pub fn update(&mut self, new_state: ConnectionState) -> Option<ConnectionState> {
        if self.current == Some(new_state) {
            return None;
        }

        self.current = Some(new_state);
        Some(new_state)
    }

    pub fn is_connected(&self) -> bool {
        self.current == Some(ConnectionState::Connected)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TouchState {
    #[default]
    Idle,
    Touched,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MuteState {
    Muted,
    #[default]
    Unmuted,
}

impl MuteState {
    pub fn from_muted(muted: bool) -> Self {
        if muted { MuteState::Muted } else { MuteState::Unmuted }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    NoColor,
    Red,
    Green,
    Yellow,
    Blue,
    Purple,
    Cyan,
    White,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::NoColor,
        Color::Red,
        Color::Green,
        Color::Yellow,
        Color::Blue,
        Color::Purple,
        Color::Cyan,
        Color::White,
    ];

    pub fn code(self) -> u8 {
        match self {
            Color::NoColor => 0x00,
            Color::Red => 0x01,
            Color::Green => 0x02,
            Color::Yellow => 0x03,
            Color::Blue => 0x04,
            Color::Purple => 0x05,
            Color::Cyan => 0x06,
            Color::White => 0x07,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::NoColor => "NoColor",
            Color::Red => "Red",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::Blue => "Blue",
            Color::Purple => "Purple",
            Color::Cyan => "Cyan",
            Color::White => "White",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Exact names only: "red" or " Red" are rejected rather than guessed at.
impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Color::ALL
            .into_iter()
            .find(|color| color.name() == name)
            .ok_or_else(|| ColorParseError { name: name.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    FullBright,
    Dim,
    FastPulse,
    SlowPulse,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::FullBright, Mode::Dim, Mode::FastPulse, Mode::SlowPulse];

    pub fn code(self) -> u8 {
        match self {
            Mode::FullBright => 0x00,
            Mode::Dim => 0x10,
            Mode::FastPulse => 0x20,
            Mode::SlowPulse => 0x30,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::FullBright => "FullBright",
            Mode::Dim => "Dim",
            Mode::FastPulse => "FastPulse",
            Mode::SlowPulse => "SlowPulse",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .ok_or_else(|| ModeParseError { name: name.to_string() })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAssignment {
    pub muted_color: Color,
    pub unmuted_color: Color,
}

impl ColorAssignment {
    pub fn for_state(&self, mute: MuteState) -> Color {
        match mute {
            MuteState::Muted => self.muted_color,
            MuteState::Unmuted => self.unmuted_color,
        }
    }
}

impl Default for ColorAssignment {
    fn default() -> Self {
        ColorAssignment {
            muted_color: Color::Red,
            unmuted_color: Color::Green,
        }
    }
}

/// A single LED command byte: the color code plus the mode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCommand(u8);

impl DeviceCommand {
    pub fn new(color: Color, mode: Mode) -> Self {
        DeviceCommand(color.code() + mode.code())
    }

    pub fn byte(self) -> u8 {
        self.0
    }

    pub fn report(self) -> [u8; 2] {
        [COMMAND_REPORT_ID, self.0]
    }
}
