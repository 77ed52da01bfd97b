//! JSON message types for the client-facing WebSocket protocol.
//!
//! # Message flow
//!
//! ```text
//! Client → Bridge:  {"k":"abs:x","v":"50","t":1700000000000}  →  ClientEventMsg
//! Bridge → Client:  AckMsg  →  {"t":1700000000000}
//! ```
//!
//! The field names are single letters because the web client sends one
//! message per changed control on every touch move.
//!
//! - `k` names an axis or a button (see `joypad_core::KeyTable`).
//! - `v` is an integer, sent either as a JSON number or as a numeric string.
//! - `t` is an opaque client timestamp.  The bridge never interprets it; it
//!   only echoes it back so the client can measure round-trip lag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One client-originated input event, as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEventMsg {
    /// Key identifier, e.g. `"abs:x"` or `"btn:a"`.
    #[serde(rename = "k")]
    pub key: String,

    /// Axis magnitude or button state.
    #[serde(rename = "v")]
    pub value: WireValue,

    /// Opaque client timestamp, echoed back in the acknowledgement.
    ///
    /// Absent timestamps are echoed as `null`.
    #[serde(rename = "t", default)]
    pub time: Value,
}

/// An integer that may arrive as a JSON number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Number(i64),
    Text(String),
}

/// Acknowledgement sent after an event has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckMsg {
    /// The timestamp from the acknowledged [`ClientEventMsg`].
    pub t: Value,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
