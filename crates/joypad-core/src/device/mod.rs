//! The virtual gamepad: one OS-level input device and the operations on it.
//!
//! [`VirtualGamepad`] owns an [`EventSink`] created by a [`DeviceBackend`].
//! The backend is the only piece that knows about the OS (uinput on Linux,
//! an in-memory recorder in tests); the gamepad itself only enforces the
//! capability set and the event/sync framing.
//!
//! # Framing
//!
//! The kernel input model batches changes into frames terminated by a
//! `SYN_REPORT` event.  Every [`VirtualGamepad::send_axis`] and
//! [`VirtualGamepad::send_button`] call writes exactly one value event and
//! then attempts exactly one `SYN_REPORT`, even when the value write failed.
//! A failure is reported to the caller but never invalidates the device.

use std::io;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Capabilities;
use crate::keymap::linux_input::{EV_ABS, EV_KEY, EV_SYN, SYN_REPORT};
use crate::keymap::{Axis, Button};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Which half of a value/sync pair failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Value,
    Sync,
}

/// Errors produced by the virtual device layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The device could not be created or registered with the OS.
    ///
    /// No partially registered device is left behind when this is returned.
    #[error("failed to create device '{name}' ({step}): {source}")]
    Creation {
        name: String,
        step: &'static str,
        #[source]
        source: io::Error,
    },

    /// Writing an event to the device failed.  The device stays usable.
    #[error("failed to write {stage:?} event (type {event_type:#04x}, code {code:#05x}): {source}")]
    Write {
        stage: WriteStage,
        event_type: u16,
        code: u16,
        #[source]
        source: io::Error,
    },

    /// The axis is not part of this device's capability set.
    #[error("axis {0} is not enabled on this device")]
    AxisDisabled(Axis),

    /// The button is not part of this device's capability set.
    #[error("button {0} is not enabled on this device")]
    ButtonDisabled(Button),

    /// Releasing the OS device failed.
    #[error("failed to close device '{name}': {source}")]
    Close {
        name: String,
        #[source]
        source: io::Error,
    },
}

// ── Backend seam ──────────────────────────────────────────────────────────────

/// A single kernel input event: type, code and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn abs(axis: Axis, value: i32) -> Self {
        Self {
            event_type: EV_ABS,
            code: axis.code(),
            value,
        }
    }

    pub fn key(button: Button, value: i32) -> Self {
        Self {
            event_type: EV_KEY,
            code: button.code(),
            value,
        }
    }

    pub fn sync_report() -> Self {
        Self {
            event_type: EV_SYN,
            code: SYN_REPORT,
            value: 0,
        }
    }

    pub fn is_sync(&self) -> bool {
        self.event_type == EV_SYN
    }
}

/// Range and noise settings applied to every enabled absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub minimum: i32,
    pub maximum: i32,
    /// Changes smaller than this are treated as noise by consumers.
    pub fuzz: i32,
    /// Dead zone around the centre.
    pub flat: i32,
    pub resolution: i32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self {
            minimum: -100,
            maximum: 100,
            fuzz: 5,
            flat: 0,
            resolution: 1,
        }
    }
}

/// Everything a backend needs to register one device with the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpec {
    pub name: String,
    pub axes: Vec<Axis>,
    pub buttons: Vec<Button>,
    pub range: AxisRange,
}

impl DeviceSpec {
    /// Derives the registration spec from a capability set.
    pub fn from_capabilities(name: &str, capabilities: Capabilities, range: AxisRange) -> Self {
        Self {
            name: name.to_string(),
            axes: capabilities.axes(),
            buttons: capabilities.buttons(),
            range,
        }
    }
}

/// An open handle to one OS-level virtual input device.
pub trait EventSink: Send {
    /// Submits one raw event to the device.
    fn write_event(&mut self, event: RawEvent) -> io::Result<()>;

    /// Destroys the device registration and releases the handle.
    fn close(self: Box<Self>) -> io::Result<()>;
}

/// Creates OS-level devices.
///
/// Implementations must release any partially acquired resource before
/// returning an error.
pub trait DeviceBackend: Send + Sync {
    fn create(&self, spec: &DeviceSpec) -> Result<Box<dyn EventSink>, DeviceError>;
}

// ── VirtualGamepad ────────────────────────────────────────────────────────────

/// One emulated gamepad registered with the OS.
///
/// The enabled axis/button set is fixed at creation.  The OS handle is never
/// exposed; only the four lifecycle operations are.
pub struct VirtualGamepad {
    name: String,
    capabilities: Capabilities,
    sink: Box<dyn EventSink>,
}

impl std::fmt::Debug for VirtualGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualGamepad")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl VirtualGamepad {
    /// Registers a new device with the default axis range.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::Creation`] if the backend cannot open its
    /// resource or the OS refuses the registration.
    pub fn create(
        backend: &dyn DeviceBackend,
        name: &str,
        capabilities: Capabilities,
    ) -> Result<Self, DeviceError> {
        Self::create_with_range(backend, name, capabilities, AxisRange::default())
    }

    /// Registers a new device with an explicit axis range.
    ///
    /// # Errors
    ///
    /// See [`VirtualGamepad::create`].
    pub fn create_with_range(
        backend: &dyn DeviceBackend,
        name: &str,
        capabilities: Capabilities,
        range: AxisRange,
    ) -> Result<Self, DeviceError> {
        let spec = DeviceSpec::from_capabilities(name, capabilities, range);
        let sink = backend.create(&spec)?;
        info!(
            "created virtual gamepad '{name}' ({} axes, {} buttons)",
            spec.axes.len(),
            spec.buttons.len()
        );
        Ok(Self {
            name: name.to_string(),
            capabilities,
            sink,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Writes an absolute-axis value followed by a sync marker.
    ///
    /// # Errors
    ///
    /// [`DeviceError::AxisDisabled`] if the axis is not enabled (nothing is
    /// written), or [`DeviceError::Write`] if either write failed.
    pub fn send_axis(&mut self, axis: Axis, value: i32) -> Result<(), DeviceError> {
        if !self.capabilities.enables_axis(axis) {
            return Err(DeviceError::AxisDisabled(axis));
        }
        self.send_framed(RawEvent::abs(axis, value))
    }

    /// Writes a button state followed by a sync marker.
    ///
    /// The value is forwarded verbatim; by convention 0 is released and
    /// anything else is pressed.
    ///
    /// # Errors
    ///
    /// [`DeviceError::ButtonDisabled`] if the button is not enabled (nothing
    /// is written), or [`DeviceError::Write`] if either write failed.
    pub fn send_button(&mut self, button: Button, value: i32) -> Result<(), DeviceError> {
        if !self.capabilities.enables_button(button) {
            return Err(DeviceError::ButtonDisabled(button));
        }
        self.send_framed(RawEvent::key(button, value))
    }

    /// Destroys the OS registration and releases the handle.
    ///
    /// Takes `self` by value, so a device can only be closed once.
    ///
    /// # Errors
    ///
    /// [`DeviceError::Close`] if the backend reports a failure while
    /// releasing the device.
    pub fn close(self) -> Result<(), DeviceError> {
        let name = self.name;
        self.sink
            .close()
            .map_err(|source| DeviceError::Close {
                name: name.clone(),
                source,
            })?;
        info!("closed virtual gamepad '{name}'");
        Ok(())
    }

    fn send_framed(&mut self, event: RawEvent) -> Result<(), DeviceError> {
        let value_result = self.sink.write_event(event);
        // The sync is attempted even if the value write failed so the device
        // never sits on a half-open frame.
        let sync = RawEvent::sync_report();
        let sync_result = self.sink.write_event(sync);

        debug!(
            "{}: type={:#04x} code={:#05x} value={}",
            self.name, event.event_type, event.code, event.value
        );

        match (value_result, sync_result) {
            (Err(source), _) => Err(DeviceError::Write {
                stage: WriteStage::Value,
                event_type: event.event_type,
                code: event.code,
                source,
            }),
            (Ok(()), Err(source)) => Err(DeviceError::Write {
                stage: WriteStage::Sync,
                event_type: sync.event_type,
                code: sync.code,
                source,
            }),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
