//! Gamepad descriptor records.
//!
//! Descriptors are JSON files that tell the web client which on-screen
//! controller layouts exist.  The bridge loads them at startup for
//! presentation only; nothing in event routing or decoding reads them.
//!
//! ```json
//! {"name":"snes","type":"svg","title":"SNES","description":"D-pad and four face buttons"}
//! ```

use serde::{Deserialize, Serialize};

/// One gamepad layout offered to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadDescriptor {
    /// Short machine name; also the asset file stem.
    pub name: String,
    /// Layout kind, e.g. `"svg"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable title.
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_reads_type_field() {
        let raw = r#"{"name":"snes","type":"svg","title":"SNES","description":"Classic"}"#;
        let d: GamepadDescriptor = serde_json::from_str(raw).unwrap();
        assert_eq!(d.kind, "svg");
        assert_eq!(d.title, "SNES");
    }

    #[test]
    fn test_descriptor_description_is_optional() {
        let raw = r#"{"name":"n64","type":"svg","title":"N64"}"#;
        let d: GamepadDescriptor = serde_json::from_str(raw).unwrap();
        assert!(d.description.is_empty());
    }
}
