//! Microphone control through `pactl`, which talks to both PulseAudio and PipeWire.

use log::{debug, warn};
use std::process::Command;

use crate::audio::MicrophoneControl;

pub const DEFAULT_SOURCE: &str = "@DEFAULT_SOURCE@";

pub struct PactlMicrophone {
    source: String,
}

impl PactlMicrophone {
    pub fn new(source: String) -> Self {
        PactlMicrophone { source }
    }

    fn set_mute(&self, muted: bool) {
        let flag = if muted { "1" } else { "0" };

        match Command::new("pactl").args(["set-source-mute", &self.source, flag]).output() {
            Ok(output) if output.status.success() => {
                debug!("Source {} mute set to {}", self.source, muted);
            },
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                warn!("pactl set-source-mute failed: {}", stderr.trim());
            },
            Err(err) => warn!("Failed to run pactl: {}", err),
        }
    }
}

impl Default for PactlMicrophone {
    fn default() -> Self {
        PactlMicrophone::new(DEFAULT_SOURCE.to_string())
    }
}

impl MicrophoneControl for PactlMicrophone {
    fn is_muted(&self) -> bool {
        let output = match Command::new("pactl").args(["get-source-mute", &self.source]).output() {
            Ok(output) => output,
            Err(err) => {
                warn!("Failed to run pactl: {}", err);
                return false;
            },
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("pactl get-source-mute failed: {}", stderr.trim());
            return false;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_mute_output(&stdout).unwrap_or_else(|| {
            warn!("Could not parse pactl mute state: {}", stdout.trim());
            false
        })
    }

    fn mute(&self) {
        self.set_mute(true);
    }

    fn unmute(&self) {
        self.set_mute(false);
    }
}

// "Mute: yes" / "Mute: no"
fn parse_mute_output(output: &str) -> Option<bool> {
    let value = output.lines().find_map(|line| line.trim().strip_prefix("Mute:"))?;

    match value.trim() {
        "yes" => Some(true),
        "no" => Some(false),
        _ => None,
    }
}
