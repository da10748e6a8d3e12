use std::any::Any;
use std::io;
use std::str::Utf8Error;
use thiserror::Error;
use serde_json;

use crate::device::types::DeviceIdentity;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },

    #[error("Invalid color in config file: {source}")]
    InvalidColor { #[from] source: ColorParseError },
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to start application (device): {source}")]
    Device { #[from] source: DeviceError },

    #[error("Failed to start async runtime: {source}")]
    Runtime { source: io::Error },
}

/// Why a located device could not be opened. The split lets the caller pick the retry delay.
#[derive(Error, Debug)]
pub enum OpenError {
    #[error("Device {identity} is not attached")]
    NotFound { identity: DeviceIdentity },

    #[error("Device {identity} is attached but could not be opened: {message}")]
    Busy { identity: DeviceIdentity, message: String },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (hidapi): {source}")]
    Hid { #[from] source: hidapi::HidError },

    #[error("Error communicating with device: {source}")]
    Io { #[from] source: io::Error },

    #[error("{source}")]
    Open { #[from] source: OpenError },

    #[error("No button is connected")]
    NotConnected,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown color name: {name:?}")]
pub struct ColorParseError {
    pub name: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown mode name: {name:?}")]
pub struct ModeParseError {
    pub name: String,
}

/// Raised by the UI listener for message types outside the closed set. Fatal to the listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UiMessageError {
    #[error("'{kind}' is not a supported UI message type")]
    UnsupportedVariant { kind: String },
}

pub fn readable_thread_panic_error(error: &Box<dyn Any + Send + 'static>) -> String {
    let mut stringified = String::from("???");

    if let Some(s) = error.downcast_ref::<&str>() {
        stringified = s.to_string();
    }
    else if let Some(s) = error.downcast_ref::<String>() {
        stringified = s.clone();
    }

    format!("panic from task: [{}]", stringified)
}
