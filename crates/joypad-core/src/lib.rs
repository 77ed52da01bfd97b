//! # joypad-core
//!
//! Shared library for Joypad-Over-WiFi containing the gamepad capability
//! model, the key identifier tables, and the virtual device layer.
//!
//! This crate has no dependencies on sockets or on any particular OS input
//! API.  OS access happens behind the [`device::DeviceBackend`] trait, which
//! the bridge implements with Linux uinput.
//!
//! - **`domain`** – capability flags and presets.
//! - **`keymap`** – axis/button identifiers, their Linux event codes, and the
//!   immutable table mapping wire key strings (`"abs:x"`, `"btn:a"`) to them.
//! - **`device`** – [`VirtualGamepad`]: create, send-axis, send-button, close.

pub mod device;
pub mod domain;
pub mod keymap;

pub use device::{DeviceBackend, DeviceError, EventSink, RawEvent, VirtualGamepad};
pub use domain::capability::{Capabilities, LayoutPreset};
pub use keymap::{Axis, Button, KeyTable, Resolved};
