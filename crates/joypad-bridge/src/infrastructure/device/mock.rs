//! Recording device backend for tests.
//!
//! [`MockDeviceBackend`] replaces uinput with in-memory recording.  Every
//! device it creates gets its own event log, indexed in creation order, so
//! assertions can check exactly which events reached which port and in what
//! order.
//!
//! The backend is cheaply cloneable and all clones share state: hand one
//! clone to [`PortRegistry::initialize`](crate::application::PortRegistry::initialize)
//! and keep another to inspect what the bridge wrote.
//!
//! ```ignore
//! let backend = MockDeviceBackend::new();
//! let ports = PortRegistry::initialize(&backend, 2, "Joypad", Capabilities::FULL)?;
//! // ... drive the bridge ...
//! assert_eq!(backend.events(0).len(), 2);
//! ```

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use joypad_core::device::DeviceSpec;
use joypad_core::{DeviceBackend, DeviceError, EventSink, RawEvent};

#[derive(Debug)]
struct MockDevice {
    spec: DeviceSpec,
    events: Vec<RawEvent>,
    closed: bool,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<MockDevice>,
    attempts: usize,
    fail_creation_at: Option<usize>,
    fail_writes: bool,
}

/// In-memory backend that records every created device and written event.
#[derive(Debug, Clone, Default)]
pub struct MockDeviceBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockDeviceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the `n`th creation attempt (0-based) fail with a creation error.
    pub fn fail_creation_at(self, n: usize) -> Self {
        self.lock().fail_creation_at = Some(n);
        self
    }

    /// When set, every subsequent write on every device fails.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Names of successfully created devices, in creation order.
    pub fn created_names(&self) -> Vec<String> {
        self.lock()
            .devices
            .iter()
            .map(|d| d.spec.name.clone())
            .collect()
    }

    /// Registration spec of device `index`.
    pub fn spec(&self, index: usize) -> Option<DeviceSpec> {
        self.lock().devices.get(index).map(|d| d.spec.clone())
    }

    /// Events written to device `index`; empty if there is no such device.
    pub fn events(&self, index: usize) -> Vec<RawEvent> {
        self.lock()
            .devices
            .get(index)
            .map(|d| d.events.clone())
            .unwrap_or_default()
    }

    /// Number of devices that have been closed.
    pub fn closed_count(&self) -> usize {
        self.lock().devices.iter().filter(|d| d.closed).count()
    }

    pub fn is_closed(&self, index: usize) -> bool {
        self.lock().devices.get(index).is_some_and(|d| d.closed)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeviceBackend for MockDeviceBackend {
    fn create(&self, spec: &DeviceSpec) -> Result<Box<dyn EventSink>, DeviceError> {
        let mut state = self.lock();
        let attempt = state.attempts;
        state.attempts += 1;
        if state.fail_creation_at == Some(attempt) {
            return Err(DeviceError::Creation {
                name: spec.name.clone(),
                step: "opening /dev/uinput",
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            });
        }
        state.devices.push(MockDevice {
            spec: spec.clone(),
            events: Vec::new(),
            closed: false,
        });
        Ok(Box::new(MockSink {
            state: Arc::clone(&self.state),
            index: state.devices.len() - 1,
        }))
    }
}

struct MockSink {
    state: Arc<Mutex<MockState>>,
    index: usize,
}

impl MockSink {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSink for MockSink {
    fn write_event(&mut self, event: RawEvent) -> io::Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock write failure"));
        }
        let index = self.index;
        match state.devices.get_mut(index) {
            Some(device) if !device.closed => {
                device.events.push(event);
                Ok(())
            }
            _ => Err(io::Error::new(io::ErrorKind::NotConnected, "device closed")),
        }
    }

    fn close(self: Box<Self>) -> io::Result<()> {
        let mut state = self.lock();
        if let Some(device) = state.devices.get_mut(self.index) {
            device.closed = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joypad_core::{Axis, Capabilities, VirtualGamepad};

    #[test]
    fn test_each_device_gets_its_own_log() {
        // Arrange
        let backend = MockDeviceBackend::new();
        let mut a = VirtualGamepad::create(&backend, "A", Capabilities::SIMPLE_ANALOG).unwrap();
        let mut b = VirtualGamepad::create(&backend, "B", Capabilities::SIMPLE_ANALOG).unwrap();

        // Act
        a.send_axis(Axis::X, 1).unwrap();
        b.send_axis(Axis::Y, 2).unwrap();
        b.send_axis(Axis::Y, 3).unwrap();

        // Assert
        assert_eq!(backend.events(0).len(), 2);
        assert_eq!(backend.events(1).len(), 4);
        assert_eq!(backend.created_names(), vec!["A", "B"]);
    }

    #[test]
    fn test_clones_share_state() {
        let backend = MockDeviceBackend::new();
        let observer = backend.clone();

        let pad = VirtualGamepad::create(&backend, "A", Capabilities::FULL).unwrap();
        pad.close().unwrap();

        assert!(observer.is_closed(0));
        assert_eq!(observer.spec(0).unwrap().axes.len(), 4);
    }

    #[test]
    fn test_fail_writes_surfaces_write_error() {
        let backend = MockDeviceBackend::new();
        let mut pad = VirtualGamepad::create(&backend, "A", Capabilities::FULL).unwrap();

        backend.set_fail_writes(true);

        assert!(pad.send_axis(Axis::Rx, 1).is_err());
        assert!(backend.events(0).is_empty());
    }

    #[test]
    fn test_fail_creation_at_only_fails_that_attempt() {
        let backend = MockDeviceBackend::new().fail_creation_at(0);

        assert!(VirtualGamepad::create(&backend, "A", Capabilities::FULL).is_err());
        assert!(VirtualGamepad::create(&backend, "B", Capabilities::FULL).is_ok());
        assert_eq!(backend.created_names(), vec!["B"]);
    }
}
