//! Infrastructure layer for joypad-bridge.
//!
//! Everything that touches the outside world lives here:
//!
//! - [`device`]: the uinput backend and the recording backend used in tests
//! - [`ws_server`]: the TCP accept loop and the per-port connection router
//! - [`descriptors`]: gamepad descriptor discovery on disk
//! - [`keymap_file`]: custom key tables in TOML
//!
//! Event decoding and port ownership are application concerns and are only
//! called from here.

pub mod descriptors;
pub mod device;
pub mod keymap_file;
pub mod ws_server;

pub use ws_server::{run_server, serve};
