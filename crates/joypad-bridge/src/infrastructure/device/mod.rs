//! Device backends.
//!
//! The uinput backend is selected at compile time on Linux.  The recording
//! backend in [`mock`] is always built so integration tests and non-Linux
//! development can run the whole bridge without touching the OS.

pub mod mock;

#[cfg(target_os = "linux")]
pub mod uinput;
