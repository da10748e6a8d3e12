use log::{debug, error, info};
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::device::constants::CYCLE_STEP_DELAY;
use crate::device::link::{write_command, DeviceLink};
use crate::device::locator::DeviceLocator;
use crate::device::types::{Color, ColorAssignment, DeviceCommand, Mode, MuteState};
use crate::error::DeviceError;

/// The order in which `cycle_colors` shows the palette.
pub const CYCLE_COLORS: [Color; 8] = [
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Purple,
    Color::Red,
    Color::White,
    Color::Yellow,
    Color::NoColor,
];

/// Maps the mute state to an LED command and writes it.
#[derive(Debug)]
pub struct ColorController {
    assignment: ColorAssignment,
}

impl ColorController {
    pub fn new(assignment: ColorAssignment) -> Self {
        ColorController { assignment }
    }

    pub fn assignment(&self) -> ColorAssignment {
        self.assignment
    }

    pub fn set_muted_color(&mut self, color: Color) {
        self.assignment.muted_color = color;
    }

    pub fn set_unmuted_color(&mut self, color: Color) {
        self.assignment.unmuted_color = color;
    }

    /// Switch both slots off; the next render turns the LED dark.
    pub fn turn_off(&mut self) {
        self.assignment = ColorAssignment {
            muted_color: Color::NoColor,
            unmuted_color: Color::NoColor,
        };
    }

    /// Write `color` in `mode` to the button. Write failures mark the link disconnected.
    pub fn set(&self, link: &mut DeviceLink, color: Color, mode: Mode) {
        if !link.is_connected() {
            debug!("Not connected, skipping color {}", color);
            return;
        }

        let command = DeviceCommand::new(color, mode);
        if let Err(err) = link.write_command(command) {
            error!("Failed to set button color to {}: {}", color, err);
            link.detach();
        }
    }

    /// Show the color assigned to `mute`. Brightness is always full.
    pub fn render(&self, link: &mut DeviceLink, mute: MuteState) {
        self.set(link, self.assignment.for_state(mute), Mode::FullBright);
    }
}

/// Show every color for a moment, then switch the LED off.
pub async fn cycle_colors(locator: &dyn DeviceLocator, cancel: &CancellationToken) -> Result<(), DeviceError> {
    let identity = locator.find().ok_or(DeviceError::NotConnected)?;
    let mut handle = locator.open(identity)?;

    for color in CYCLE_COLORS {
        info!("Showing {}", color);
        write_command(handle.as_mut(), DeviceCommand::new(color, Mode::FullBright))?;

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(Duration::from_millis(CYCLE_STEP_DELAY)) => {},
        }
    }

    write_command(handle.as_mut(), DeviceCommand::new(Color::NoColor, Mode::FullBright))
}
