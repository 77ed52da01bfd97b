//! Bridge configuration types.
//!
//! [`BridgeConfig`] holds every startup setting.  `main.rs` fills it from
//! CLI arguments and environment variables; it is read once, while the ports
//! and the listener are being set up, and never afterwards.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use joypad_core::LayoutPreset;

/// All startup configuration for the bridge.
///
/// # Example
///
/// ```rust
/// use joypad_bridge::domain::BridgeConfig;
///
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.bind_addr.port(), 5764);
/// assert_eq!(cfg.device_count, 4);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Address and port the WebSocket server binds to.
    pub bind_addr: SocketAddr,

    /// Number of virtual gamepads (ports) created at startup.
    pub device_count: usize,

    /// Display-name prefix; port `i` is named `"<prefix> #<i>"`.
    pub name_prefix: String,

    /// Capability preset applied to every device.
    pub layout: LayoutPreset,

    /// Directory scanned for `*.json` gamepad descriptors.
    pub gamepads_dir: PathBuf,

    /// Optional TOML key table replacing the canonical identifier set.
    pub keymap_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    /// | Field         | Default          |
    /// |---------------|------------------|
    /// | bind_addr     | `0.0.0.0:5764`   |
    /// | device_count  | 4                |
    /// | name_prefix   | `Joypad`         |
    /// | layout        | `simple-analog`  |
    /// | gamepads_dir  | `gamepads`       |
    /// | keymap_path   | none             |
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 5764)),
            device_count: 4,
            name_prefix: "Joypad".to_string(),
            layout: LayoutPreset::SimpleAnalog,
            gamepads_dir: PathBuf::from("gamepads"),
            keymap_path: None,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
