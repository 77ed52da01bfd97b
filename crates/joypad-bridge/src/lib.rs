//! joypad-bridge library crate.
//!
//! Turns phones and browsers into wireless gamepads: each WebSocket client
//! binds to one port and drives that port's virtual gamepad.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Client (JSON over WebSocket, /<port>/ws)
//!         ↓
//! [joypad-bridge]
//!   ├── domain/           Wire messages, BridgeConfig, gamepad descriptors
//!   ├── application/      Event decode/apply, port registry and leases
//!   └── infrastructure/
//!         ├── ws_server/  Accept loop and per-port router (tokio-tungstenite)
//!         ├── device/     uinput backend (Linux) and recording backend
//!         ├── descriptors Descriptor directory scan
//!         └── keymap_file TOML key tables
//!         ↓
//! joypad-core VirtualGamepad → /dev/uinput
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `joypad-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`, `tungstenite`
//!   and, on Linux, `evdev`.

/// Domain layer: pure types (no I/O).
pub mod domain;

/// Application layer: event protocol and port registry.
pub mod application;

/// Infrastructure layer: WebSocket server, device backends, file loaders.
pub mod infrastructure;
