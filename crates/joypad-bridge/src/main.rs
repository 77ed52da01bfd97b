//! Joypad-Over-WiFi bridge: entry point.
//!
//! Creates a fixed number of virtual gamepads through Linux uinput and lets
//! WebSocket clients drive them, one client per gamepad.
//!
//! # Usage
//!
//! ```text
//! joypad-bridge [OPTIONS]
//!
//! Options:
//!   -n, --num <N>          Number of virtual gamepads [default: 4]
//!       --name <NAME>      Device name prefix [default: Joypad]
//!       --addr <ADDR>      Listen address [default: 0.0.0.0]
//!   -p, --port <PORT>      Listen port [default: 5764]
//!       --layout <LAYOUT>  simple-dpad | simple-analog | full [default: simple-analog]
//!       --gamepads <DIR>   Gamepad descriptor directory [default: gamepads]
//!       --keymap <FILE>    TOML key table replacing the built-in identifiers
//! ```
//!
//! Every option can also be set from the environment (`JOYPAD_NUM`,
//! `JOYPAD_NAME`, `HOST`, `PORT`, `JOYPAD_LAYOUT`, `JOYPAD_GAMEPADS`,
//! `JOYPAD_KEYMAP`).  Command-line arguments win.
//!
//! Clients connect to `ws://<addr>:<port>/<index>/ws` and send
//! `{"k":"abs:x","v":"50","t":1}`; the bridge answers `{"t":1}`.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use joypad_bridge::application::{EventDispatcher, PortRegistry};
use joypad_bridge::domain::BridgeConfig;
use joypad_bridge::infrastructure::descriptors::load_descriptors;
use joypad_bridge::infrastructure::keymap_file::load_keymap;
use joypad_bridge::infrastructure::run_server;
use joypad_core::{DeviceBackend, KeyTable, LayoutPreset};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Joypad-Over-WiFi bridge.
///
/// Turns phones and browsers into wireless gamepads.
#[derive(Debug, Parser)]
#[command(
    name = "joypad-bridge",
    about = "WebSocket-to-uinput bridge for wireless virtual gamepads",
    version
)]
struct Cli {
    /// Number of virtual gamepads (ports) to create.
    #[arg(short, long, default_value_t = 4, env = "JOYPAD_NUM")]
    num: usize,

    /// Device name prefix; gamepad `i` is registered as "<name> #<i>".
    #[arg(long, default_value = "Joypad", env = "JOYPAD_NAME")]
    name: String,

    /// IP address to listen on.
    #[arg(long, default_value = "0.0.0.0", env = "HOST")]
    addr: String,

    /// TCP port to listen on.
    #[arg(short, long, default_value_t = 5764, env = "PORT")]
    port: u16,

    /// Controls registered on every gamepad.
    #[arg(long, default_value = "simple-analog", env = "JOYPAD_LAYOUT")]
    layout: LayoutPreset,

    /// Directory holding `*.json` gamepad descriptors.
    #[arg(long, default_value = "gamepads", env = "JOYPAD_GAMEPADS")]
    gamepads: PathBuf,

    /// Optional TOML key table.
    #[arg(long, env = "JOYPAD_KEYMAP")]
    keymap: Option<PathBuf>,
}

impl Cli {
    /// Converts the parsed arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--num` is zero or `--addr` is not an IP address.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        anyhow::ensure!(self.num > 0, "--num must be at least 1");
        let ip: IpAddr = self
            .addr
            .parse()
            .with_context(|| format!("invalid listen address: '{}'", self.addr))?;

        Ok(BridgeConfig {
            bind_addr: SocketAddr::new(ip, self.port),
            device_count: self.num,
            name_prefix: self.name,
            layout: self.layout,
            gamepads_dir: self.gamepads,
            keymap_path: self.keymap,
        })
    }
}

#[cfg(target_os = "linux")]
fn device_backend() -> anyhow::Result<Box<dyn DeviceBackend>> {
    Ok(Box::new(
        joypad_bridge::infrastructure::device::uinput::UinputBackend::new(),
    ))
}

#[cfg(not(target_os = "linux"))]
fn device_backend() -> anyhow::Result<Box<dyn DeviceBackend>> {
    anyhow::bail!("virtual gamepads require Linux uinput")
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Startup is all-or-nothing: if any gamepad cannot be created the process
/// exits with an error instead of serving a partial port set.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Cli::parse().into_bridge_config()?;
    info!(
        "Joypad bridge starting: {} x '{}' ({}), listening on {}",
        config.device_count, config.name_prefix, config.layout, config.bind_addr
    );

    let table = match &config.keymap_path {
        Some(path) => load_keymap(path)
            .with_context(|| format!("failed to load key table {}", path.display()))?,
        None => KeyTable::canonical(),
    };
    info!("{} key identifier(s) recognised", table.len());

    // Presentation-only; routing never consults these.
    let descriptors = load_descriptors(&config.gamepads_dir)?;
    for descriptor in &descriptors {
        info!("gamepad layout available: {} ({})", descriptor.name, descriptor.kind);
    }

    let backend = device_backend()?;
    let registry = Arc::new(
        PortRegistry::initialize(
            backend.as_ref(),
            config.device_count,
            &config.name_prefix,
            config.layout.capabilities(),
        )
        .context("failed to create virtual gamepads")?,
    );

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let dispatcher = EventDispatcher::new(Arc::new(table));
    let result = run_server(config.bind_addr, Arc::clone(&registry), dispatcher, running).await;

    registry.shutdown();
    info!("Joypad bridge stopped");
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────────
