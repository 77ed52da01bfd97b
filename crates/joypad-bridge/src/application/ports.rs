//! Device registry: a fixed set of ports, each owning one virtual gamepad.
//!
//! A port is either idle (its gamepad parked in the slot), bound (the gamepad
//! has been moved into a [`PortLease`] held by exactly one connection), or
//! closed (shut down).  Binding moves the gamepad out of the slot under a
//! single lock acquisition, so two connections racing for the same port can
//! never both succeed.
//!
//! ```text
//!            try_bind                     drop(lease)
//!   Idle ───────────────▶ Bound ───────────────────────▶ Idle
//!    │                      │
//!    │ shutdown             │ shutdown, then drop(lease)
//!    ▼                      ▼
//!  Closed ◀─────────────── Closed   (device closed by the lease)
//! ```

use std::mem::ManuallyDrop;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use joypad_core::{Capabilities, DeviceBackend, DeviceError, VirtualGamepad};

/// Connection-level registry errors.  None of these affect other ports.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortError {
    #[error("port {index} does not exist (configured ports: 0..{count})")]
    InvalidPort { index: usize, count: usize },

    #[error("port {0} is already bound to another connection")]
    PortBusy(usize),

    #[error("port {0} has been shut down")]
    Closed(usize),
}

/// Read-only snapshot of one port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub index: usize,
    pub name: String,
    pub bound: bool,
}

enum Slot {
    Idle(VirtualGamepad),
    Bound,
    Closed,
}

struct PortSlot {
    name: String,
    state: Mutex<Slot>,
}

impl PortSlot {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panic while holding the lock cannot leave a slot half-updated:
        // every transition is a single assignment.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The fixed, ordered set of ports created at startup.
pub struct PortRegistry {
    slots: Vec<PortSlot>,
}

impl std::fmt::Debug for PortRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortRegistry")
            .field("ports", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl PortRegistry {
    /// Creates `count` gamepads named `"<name_prefix> #<i>"`, in order.
    ///
    /// # Errors
    ///
    /// The first [`DeviceError`] encountered.  Devices created before the
    /// failure are closed first; a partial port set is never returned.
    pub fn initialize(
        backend: &dyn DeviceBackend,
        count: usize,
        name_prefix: &str,
        capabilities: Capabilities,
    ) -> Result<Self, DeviceError> {
        let mut devices: Vec<VirtualGamepad> = Vec::with_capacity(count);
        for i in 0..count {
            let name = format!("{name_prefix} #{i}");
            match VirtualGamepad::create(backend, &name, capabilities) {
                Ok(device) => devices.push(device),
                Err(e) => {
                    for device in devices.drain(..).rev() {
                        if let Err(close_err) = device.close() {
                            warn!("rollback after failed initialization: {close_err}");
                        }
                    }
                    return Err(e);
                }
            }
        }

        let slots = devices
            .into_iter()
            .map(|device| PortSlot {
                name: device.name().to_string(),
                state: Mutex::new(Slot::Idle(device)),
            })
            .collect();
        info!("initialized {count} port(s)");
        Ok(Self { slots })
    }

    /// Number of ports.  Fixed for the registry's lifetime.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Describes port `index`.
    ///
    /// # Errors
    ///
    /// [`PortError::InvalidPort`] if `index` is outside `0..len()`.
    pub fn lookup(&self, index: usize) -> Result<PortInfo, PortError> {
        let slot = self.slot(index)?;
        let bound = matches!(*slot.lock(), Slot::Bound);
        Ok(PortInfo {
            index,
            name: slot.name.clone(),
            bound,
        })
    }

    /// Binds port `index` to the caller.
    ///
    /// The gamepad stays with the returned lease until the lease is dropped.
    ///
    /// # Errors
    ///
    /// [`PortError::InvalidPort`], [`PortError::PortBusy`] if another lease
    /// is live, or [`PortError::Closed`] after [`PortRegistry::shutdown`].
    pub fn try_bind(self: &Arc<Self>, index: usize) -> Result<PortLease, PortError> {
        let slot = self.slot(index)?;
        let mut state = slot.lock();
        match std::mem::replace(&mut *state, Slot::Bound) {
            Slot::Idle(device) => {
                debug!("port {index} bound");
                Ok(PortLease {
                    registry: Arc::clone(self),
                    index,
                    device: ManuallyDrop::new(device),
                })
            }
            Slot::Bound => Err(PortError::PortBusy(index)),
            Slot::Closed => {
                *state = Slot::Closed;
                Err(PortError::Closed(index))
            }
        }
    }

    /// Closes every idle gamepad and marks all ports closed.
    ///
    /// Bound gamepads are closed when their lease is dropped.  Calling this
    /// more than once is harmless.
    pub fn shutdown(&self) {
        for (index, slot) in self.slots.iter().enumerate() {
            let previous = std::mem::replace(&mut *slot.lock(), Slot::Closed);
            match previous {
                Slot::Idle(device) => close_logged(device),
                Slot::Bound => debug!("port {index} still bound; closing on release"),
                Slot::Closed => {}
            }
        }
    }

    fn slot(&self, index: usize) -> Result<&PortSlot, PortError> {
        self.slots.get(index).ok_or(PortError::InvalidPort {
            index,
            count: self.slots.len(),
        })
    }

    fn release(&self, index: usize, device: VirtualGamepad) {
        let Some(slot) = self.slots.get(index) else {
            return;
        };
        let mut state = slot.lock();
        if matches!(*state, Slot::Bound) {
            *state = Slot::Idle(device);
            debug!("port {index} released");
        } else {
            drop(state);
            close_logged(device);
        }
    }
}

fn close_logged(device: VirtualGamepad) {
    let name = device.name().to_string();
    if let Err(e) = device.close() {
        warn!("failed to close '{name}': {e}");
    }
}

/// Exclusive access to one port's gamepad.
///
/// Dereferences to the [`VirtualGamepad`].  Dropping the lease returns the
/// gamepad to its port.
pub struct PortLease {
    registry: Arc<PortRegistry>,
    index: usize,
    device: ManuallyDrop<VirtualGamepad>,
}

impl PortLease {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Debug for PortLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortLease")
            .field("index", &self.index)
            .field("device", &*self.device)
            .finish()
    }
}

impl Deref for PortLease {
    type Target = VirtualGamepad;

    fn deref(&self) -> &VirtualGamepad {
        &self.device
    }
}

impl DerefMut for PortLease {
    fn deref_mut(&mut self) -> &mut VirtualGamepad {
        &mut self.device
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        // SAFETY: `device` is taken exactly once, here, and `self` is not
        // used again afterwards.
        let device = unsafe { ManuallyDrop::take(&mut self.device) };
        self.registry.release(self.index, device);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
