//! In-memory button for tests: a locator and handles that share one simulated USB bus.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;

use crate::device::constants::{KNOWN_DEVICES, REPORT_CODE_OFFSET, REPORT_LENGTH};
use crate::device::locator::{DeviceHandle, DeviceLocator};
use crate::device::types::DeviceIdentity;
use crate::error::{DeviceError, OpenError};

#[derive(Debug)]
struct MockBus {
    identity: DeviceIdentity,
    present: bool,
    busy: bool,
    fail_reads: bool,
    fail_writes: bool,
    reports: VecDeque<Vec<u8>>,
    written: Vec<Vec<u8>>,
    find_calls: usize,
    open_calls: usize,
    open_handles: usize,
}

#[derive(Clone)]
pub struct MockLocator {
    bus: Arc<Mutex<MockBus>>,
}

impl MockLocator {
    fn new(present: bool) -> Self {
        let bus = MockBus {
            identity: KNOWN_DEVICES[0],
            present,
            busy: false,
            fail_reads: false,
            fail_writes: false,
            reports: VecDeque::new(),
            written: Vec::new(),
            find_calls: 0,
            open_calls: 0,
            open_handles: 0,
        };
        MockLocator { bus: Arc::new(Mutex::new(bus)) }
    }

    pub fn attached() -> Self {
        Self::new(true)
    }

    pub fn detached() -> Self {
        Self::new(false)
    }

    pub fn set_present(&self, present: bool) {
        self.bus.lock().present = present;
    }

    /// A busy button is found but refuses to open.
    pub fn set_busy(&self, busy: bool) {
        self.bus.lock().busy = busy;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.bus.lock().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.bus.lock().fail_writes = fail;
    }

    pub fn push_report(&self, report: &[u8]) {
        self.bus.lock().reports.push_back(report.to_vec());
    }

    /// Queue a report carrying `code` at the touch-code offset.
    pub fn push_touch(&self, code: u8) {
        let mut report = vec![0_u8; REPORT_LENGTH];
        report[REPORT_CODE_OFFSET] = code;
        self.push_report(&report);
    }

    pub fn pending_reports(&self) -> usize {
        self.bus.lock().reports.len()
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.bus.lock().written.clone()
    }

    /// The command byte of every write so far.
    pub fn commands(&self) -> Vec<u8> {
        self.bus.lock().written.iter().filter_map(|report| report.get(1).copied()).collect()
    }

    pub fn find_calls(&self) -> usize {
        self.bus.lock().find_calls
    }

    pub fn open_calls(&self) -> usize {
        self.bus.lock().open_calls
    }

    pub fn open_handles(&self) -> usize {
        self.bus.lock().open_handles
    }
}

impl DeviceLocator for MockLocator {
    fn find(&self) -> Option<DeviceIdentity> {
        let mut bus = self.bus.lock();
        bus.find_calls += 1;
        bus.present.then_some(bus.identity)
    }

    fn still_present(&self, identity: DeviceIdentity) -> bool {
        let bus = self.bus.lock();
        bus.present && bus.identity == identity
    }

    fn open(&self, identity: DeviceIdentity) -> Result<Box<dyn DeviceHandle>, OpenError> {
        let mut bus = self.bus.lock();
        bus.open_calls += 1;

        if !bus.present || bus.identity != identity {
            return Err(OpenError::NotFound { identity });
        }
        if bus.busy {
            return Err(OpenError::Busy { identity, message: "opened by another process".to_string() });
        }

        bus.open_handles += 1;
        Ok(Box::new(MockHandle { bus: self.bus.clone() }))
    }
}

struct MockHandle {
    bus: Arc<Mutex<MockBus>>,
}

impl DeviceHandle for MockHandle {
    fn read_timeout(&mut self, buffer: &mut [u8], timeout: Duration) -> Result<usize, DeviceError> {
        {
            let mut bus = self.bus.lock();
            if bus.fail_reads || !bus.present {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged").into());
            }

            if let Some(report) = bus.reports.pop_front() {
                let len = report.len().min(buffer.len());
                buffer[..len].copy_from_slice(&report[..len]);
                return Ok(len);
            }
        }

        std::thread::sleep(timeout);
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        let mut bus = self.bus.lock();
        if bus.fail_writes || !bus.present {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged").into());
        }

        bus.written.push(data.to_vec());
        Ok(data.len())
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.bus.lock().open_handles -= 1;
    }
}
