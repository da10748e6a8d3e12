use std::path::PathBuf;
use clap::{Parser, Subcommand};

use crate::audio::pactl::DEFAULT_SOURCE;

#[derive(Debug, Parser)]
#[command(name = "muteme-button", version, about = "Toggle the microphone with a MuteMe button")]
pub struct Cli {
    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Color shown while muted, overriding the config file
    #[arg(long, global = true)]
    pub muted_color: Option<String>,

    /// Color shown while unmuted, overriding the config file
    #[arg(long, global = true)]
    pub unmuted_color: Option<String>,

    /// PulseAudio/PipeWire source to mute
    #[arg(long, global = true, default_value = DEFAULT_SOURCE)]
    pub source: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Keep the button connected and toggle mute on touch (default)
    Run,
    /// Show every LED color once, then switch the LED off
    CycleColors,
}
