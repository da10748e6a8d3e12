use std::time::Duration;
use hidapi::{HidApi, HidDevice};
use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::device::constants::KNOWN_DEVICES;
use crate::device::types::DeviceIdentity;
use crate::error::{DeviceError, OpenError};

/// An open, exclusively owned connection to the button.
pub trait DeviceHandle: Send {
    /// Read one report. Returns `Ok(0)` if nothing arrived within `timeout`.
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, DeviceError>;

    fn write(&mut self, data: &[u8]) -> Result<usize, DeviceError>;
}

/// Finds the button among the attached HID devices.
pub trait DeviceLocator: Send + Sync {
    /// The first attached supported button, in enumeration order.
    fn find(&self) -> Option<DeviceIdentity>;

    fn still_present(&self, identity: DeviceIdentity) -> bool;

    fn open(&self, identity: DeviceIdentity) -> Result<Box<dyn DeviceHandle>, OpenError>;
}

pub struct HidLocator {
    api: Mutex<HidApi>,
    identities: Vec<DeviceIdentity>,
}

impl HidLocator {
    pub fn new() -> Result<Self, DeviceError> {
        Self::with_identities(KNOWN_DEVICES.to_vec())
    }

    pub fn with_identities(identities: Vec<DeviceIdentity>) -> Result<Self, DeviceError> {
        let api = HidApi::new()?;
        Ok(HidLocator { api: Mutex::new(api), identities })
    }

    fn refreshed_identities(&self) -> Vec<DeviceIdentity> {
        let mut api = self.api.lock();

        if let Err(err) = api.refresh_devices() {
            warn!("Failed to enumerate HID devices: {}", err);
            return Vec::new();
        }

        api.device_list()
            .map(|info| DeviceIdentity { vendor_id: info.vendor_id(), product_id: info.product_id() })
            .collect()
    }
}

impl DeviceLocator for HidLocator {
    fn find(&self) -> Option<DeviceIdentity> {
        let attached = self.refreshed_identities();

        let found = attached
            .into_iter()
            .find(|identity| self.identities.contains(identity));

        match found {
            Some(identity) => info!("Found button {}", identity),
            None => debug!("No attached HID device matched"),
        }

        found
    }

    fn still_present(&self, identity: DeviceIdentity) -> bool {
        self.refreshed_identities().contains(&identity)
    }

    fn open(&self, identity: DeviceIdentity) -> Result<Box<dyn DeviceHandle>, OpenError> {
        if !self.still_present(identity) {
            return Err(OpenError::NotFound { identity });
        }

        let api = self.api.lock();
        match api.open(identity.vendor_id, identity.product_id) {
            Ok(device) => {
                info!("Opened button {}", identity);
                Ok(Box::new(HidHandle { device }))
            },
            Err(err) => Err(OpenError::Busy { identity, message: err.to_string() }),
        }
    }
}

struct HidHandle {
    device: HidDevice,
}

impl DeviceHandle for HidHandle {
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        let millis = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        Ok(self.device.read_timeout(buffer, millis)?)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        Ok(self.device.write(data)?)
    }
}
