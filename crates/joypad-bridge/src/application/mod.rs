//! Application layer for joypad-bridge.
//!
//! The application layer knows *what* happens to an event and to a port,
//! but not how bytes arrive or how the OS is reached.
//!
//! # Responsibilities
//!
//! - Decoding client events and applying them to a gamepad
//!   ([`event_protocol`])
//! - Owning the fixed set of ports and handing out exclusive leases on them
//!   ([`ports`])
//!
//! # What does NOT belong here?
//!
//! - Sockets, WebSocket framing or task spawning (infrastructure)
//! - uinput calls (infrastructure, behind `joypad_core::DeviceBackend`)

pub mod event_protocol;
pub mod ports;

pub use event_protocol::{apply, decode, EventDispatcher, EventError, InputEvent, ProtocolError};
pub use ports::{PortError, PortInfo, PortLease, PortRegistry};
