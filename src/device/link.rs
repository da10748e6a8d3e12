use std::time::Duration;
use log::info;

use crate::device::locator::DeviceHandle;
use crate::device::types::{ConnectionState, ConnectionTracker, DeviceCommand};
use crate::error::DeviceError;
use crate::ui::channel::UiNotifier;
use crate::ui::types::OutboundUiMessage;

/// The open device stream plus the connection state derived from it.
///
/// Every connection edge is logged and forwarded to the UI exactly once.
pub struct DeviceLink {
    handle: Option<Box<dyn DeviceHandle>>,
    connection: ConnectionTracker,
    notifier: UiNotifier,
}

impl DeviceLink {
    pub fn new(notifier: UiNotifier) -> Self {
        DeviceLink {
            handle: None,
            connection: ConnectionTracker::default(),
            notifier,
        }
    }

    /// Forget everything, including the last reported connection state.
    pub fn reset(&mut self) {
        self.handle = None;
        self.connection.reset();
    }

    pub fn attach(&mut self, handle: Box<dyn DeviceHandle>) {
        // the previous stream, if any, is closed before the new one is used
        self.handle = Some(handle);
        self.set_connection(ConnectionState::Connected);
    }

    /// Close the stream (if open) and report the button as disconnected.
    pub fn detach(&mut self) {
        self.handle = None;
        self.set_connection(ConnectionState::Disconnected);
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some() && self.connection.is_connected()
    }

    pub fn has_handle(&self) -> bool {
        self.handle.is_some()
    }

    fn set_connection(&mut self, state: ConnectionState) {
        if let Some(edge) = self.connection.update(state) {
            match edge {
                ConnectionState::Connected => info!("Button is connected"),
                ConnectionState::Disconnected => info!("Button is not connected"),
            }
            self.notifier.send_to_ui(edge.into());
        }
    }

    pub fn notify(&mut self, message: OutboundUiMessage) {
        self.notifier.send_to_ui(message);
    }

    pub fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        match self.handle.as_mut() {
            Some(handle) => handle.read_timeout(buffer, timeout),
            None => Err(DeviceError::NotConnected),
        }
    }

    pub fn write_command(&mut self, command: DeviceCommand) -> Result<(), DeviceError> {
        match self.handle.as_mut() {
            Some(handle) => write_command(handle.as_mut(), command),
            None => Err(DeviceError::NotConnected),
        }
    }
}

pub fn write_command(handle: &mut dyn DeviceHandle, command: DeviceCommand) -> Result<(), DeviceError> {
    handle.write(&command.report())?;
    Ok(())
}
