//! Domain layer for joypad-bridge.
//!
//! Pure types with no dependencies on I/O, networking, or the OS input
//! subsystem:
//!
//! - Message types (the JSON "language" between client and bridge)
//! - Configuration structures
//! - Gamepad descriptor records
//!
//! No `tokio`, `TcpStream`, `WebSocket` or file I/O belongs here.

pub mod config;
pub mod descriptor;
pub mod messages;

pub use config::BridgeConfig;
pub use descriptor::GamepadDescriptor;
pub use messages::{AckMsg, ClientEventMsg, WireValue};
