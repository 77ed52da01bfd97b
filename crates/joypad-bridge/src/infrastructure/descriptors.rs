//! Gamepad descriptor discovery.
//!
//! Scans one directory (non-recursively) for `*.json` files.  A file that
//! cannot be read or decoded is logged and skipped; it never stops startup.
//! A missing or unreadable directory does.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::GamepadDescriptor;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("cannot read gamepad directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads every decodable descriptor in `dir`, sorted by name.
///
/// # Errors
///
/// [`DescriptorError::Directory`] if `dir` cannot be listed.
pub fn load_descriptors(dir: &Path) -> Result<Vec<GamepadDescriptor>, DescriptorError> {
    info!("loading gamepads from {}", dir.display());
    let entries = std::fs::read_dir(dir).map_err(|source| DescriptorError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut descriptors = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        match read_descriptor(&path) {
            Ok(descriptor) => {
                info!("found gamepad {} ('{}')", descriptor.name, descriptor.title);
                descriptors.push(descriptor);
            }
            Err(e) => warn!("couldn't read {}: {e}", path.display()),
        }
    }

    descriptors.sort_by(|a, b| a.name.cmp(&b.name));
    info!("{} gamepad(s) loaded", descriptors.len());
    Ok(descriptors)
}

fn read_descriptor(path: &Path) -> anyhow::Result<GamepadDescriptor> {
    let content = std::fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}
