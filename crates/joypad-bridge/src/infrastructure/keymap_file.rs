//! Custom key tables loaded from TOML.
//!
//! A deployment whose web client sends different identifiers than the
//! canonical `abs:*` / `btn:*` set can supply its own table:
//!
//! ```toml
//! [axes]
//! lx = "x"
//! ly = "y"
//!
//! [buttons]
//! jump = "a"
//! pause = "start"
//! up = "dpad-up"
//! ```
//!
//! The file replaces the canonical table entirely.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use joypad_core::keymap::KeyTableError;
use joypad_core::{Axis, Button, KeyTable};

#[derive(Debug, Error)]
pub enum KeymapFileError {
    #[error("I/O error reading key table at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse key table TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid key table: {0}")]
    Table(#[from] KeyTableError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeymapFile {
    #[serde(default)]
    axes: HashMap<String, Axis>,
    #[serde(default)]
    buttons: HashMap<String, Button>,
}

/// Parses a key table from TOML text.
///
/// # Errors
///
/// [`KeymapFileError::Parse`] for malformed TOML or unknown axis/button
/// names, [`KeymapFileError::Table`] for empty or ambiguous identifiers.
pub fn parse_keymap(content: &str) -> Result<KeyTable, KeymapFileError> {
    let file: KeymapFile = toml::from_str(content)?;
    Ok(KeyTable::from_parts(file.axes, file.buttons)?)
}

/// Reads and parses the key table at `path`.
///
/// # Errors
///
/// [`KeymapFileError::Io`] if the file cannot be read, otherwise as
/// [`parse_keymap`].
pub fn load_keymap(path: &Path) -> Result<KeyTable, KeymapFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| KeymapFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_keymap(&content)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use joypad_core::Resolved;

    #[test]
    fn test_parse_maps_custom_identifiers() {
        // Arrange
        let toml_str = r#"
            [axes]
            lx = "x"

            [buttons]
            jump = "a"
            up = "dpad-up"
        "#;

        // Act
        let table = parse_keymap(toml_str).unwrap();

        // Assert
        assert_eq!(table.len(), 3);
        assert_eq!(table.resolve("lx"), Resolved::Axis(Axis::X));
        assert_eq!(table.resolve("jump"), Resolved::Button(Button::A));
        assert_eq!(table.resolve("up"), Resolved::Button(Button::DpadUp));
        // The canonical set is replaced, not extended.
        assert_eq!(table.resolve("abs:x"), Resolved::Unknown);
    }

    #[test]
    fn test_parse_missing_sections_default_to_empty() {
        let table = parse_keymap("[buttons]\nfire = \"b\"\n").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_rejects_unknown_button_name() {
        let err = parse_keymap("[buttons]\nfire = \"trigger\"\n").unwrap_err();
        assert!(matches!(err, KeymapFileError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_unknown_section() {
        let err = parse_keymap("[triggers]\nlt = \"x\"\n").unwrap_err();
        assert!(matches!(err, KeymapFileError::Parse(_)));
    }

    #[test]
    fn test_parse_rejects_identifier_in_both_sections() {
        let err = parse_keymap("[axes]\nx = \"x\"\n[buttons]\nx = \"x\"\n").unwrap_err();
        assert!(matches!(
            err,
            KeymapFileError::Table(KeyTableError::Ambiguous(ref k)) if k == "x"
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("joypad-missing-{}.toml", uuid::Uuid::new_v4()));
        let err = load_keymap(&path).unwrap_err();
        assert!(matches!(err, KeymapFileError::Io { .. }));
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        // Arrange
        let path = std::env::temp_dir().join(format!("joypad-keymap-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[axes]\nsteer = \"rx\"\n").unwrap();

        // Act
        let result = load_keymap(&path);
        std::fs::remove_file(&path).unwrap();

        // Assert
        assert_eq!(result.unwrap().resolve("steer"), Resolved::Axis(Axis::Rx));
    }
}
