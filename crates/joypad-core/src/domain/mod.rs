//! Pure domain types with no OS dependencies.
//!
//! - **`capability`** – the bitset of features a virtual gamepad exposes and
//!   the named presets built from it.

pub mod capability;

pub use capability::{Capabilities, LayoutPreset};
