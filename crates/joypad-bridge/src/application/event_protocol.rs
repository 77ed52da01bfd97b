//! Input event protocol: decode, resolve, apply.
//!
//! Every inbound message is handled independently.  There is no handshake
//! and no state carried between events; the only thing that flows back to
//! the client is the echoed timestamp.
//!
//! ```text
//! raw bytes ──decode──▶ InputEvent ──resolve(KeyTable)──▶ Resolved ──apply──▶ VirtualGamepad
//!                                                                     └──▶ AckMsg {t}
//! ```
//!
//! Nothing in this module is fatal to a connection.  Callers log the error
//! and move on to the next message.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use joypad_core::{DeviceError, KeyTable, Resolved, VirtualGamepad};

use crate::domain::messages::{AckMsg, ClientEventMsg, WireValue};

// ── Error types ───────────────────────────────────────────────────────────────

/// The message does not conform to the `{k, v, t}` schema.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Not JSON, not an object, or a required field is missing.
    #[error("malformed event: {0}")]
    Malformed(#[from] serde_json::Error),

    /// `v` was a string that does not parse as an integer.
    #[error("malformed event: value '{0}' is not an integer")]
    NonNumericValue(String),

    /// `v` parsed but does not fit a kernel event value.
    #[error("malformed event: value {0} is out of range")]
    ValueOutOfRange(i64),
}

/// Per-event failures.  None of these end the connection.
#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The key identifier is not in the key table.
    #[error("unknown key identifier '{0}'")]
    UnknownKey(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

// ── Decoded event ─────────────────────────────────────────────────────────────

/// A validated client event.
#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub key: String,
    pub value: i32,
    /// Opaque; echoed back unchanged.
    pub time: Value,
}

/// Decodes one raw message.
///
/// Decoding is pure: the same bytes always give the same result.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the message is not a `{k, v, t}` object or
/// `v` is not an integer in `i32` range.
pub fn decode(raw: &[u8]) -> Result<InputEvent, ProtocolError> {
    let msg: ClientEventMsg = serde_json::from_slice(raw)?;
    let wide = match msg.value {
        WireValue::Number(n) => n,
        WireValue::Text(text) => text
            .parse::<i64>()
            .map_err(|_| ProtocolError::NonNumericValue(text.clone()))?,
    };
    let value = i32::try_from(wide).map_err(|_| ProtocolError::ValueOutOfRange(wide))?;
    Ok(InputEvent {
        key: msg.key,
        value,
        time: msg.time,
    })
}

/// Dispatches a resolved event to the device.
///
/// # Errors
///
/// [`EventError::UnknownKey`] for [`Resolved::Unknown`] (with an empty key;
/// [`EventDispatcher`] fills in the real identifier before calling this),
/// or [`EventError::Device`] if the device rejects or fails the write.
pub fn apply(device: &mut VirtualGamepad, resolved: Resolved, value: i32) -> Result<(), EventError> {
    match resolved {
        Resolved::Axis(axis) => device.send_axis(axis, value)?,
        Resolved::Button(button) => device.send_button(button, value)?,
        Resolved::Unknown => return Err(EventError::UnknownKey(String::new())),
    }
    Ok(())
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Decodes, resolves and applies raw messages against a shared key table.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    table: Arc<KeyTable>,
}

impl EventDispatcher {
    pub fn new(table: Arc<KeyTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &KeyTable {
        &self.table
    }

    /// Handles one message end to end and returns the acknowledgement to send.
    ///
    /// An unknown key is detected before the device is touched.
    ///
    /// # Errors
    ///
    /// Any [`EventError`]; the caller sends no acknowledgement in that case.
    pub fn handle(&self, device: &mut VirtualGamepad, raw: &[u8]) -> Result<AckMsg, EventError> {
        let event = decode(raw)?;
        let resolved = self.table.resolve(&event.key);
        if resolved == Resolved::Unknown {
            return Err(EventError::UnknownKey(event.key));
        }
        apply(device, resolved, event.value)?;
        Ok(AckMsg { t: event.time })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use joypad_core::keymap::linux_input::{ABS_X, BTN_A, EV_ABS, EV_KEY};
    use joypad_core::{Capabilities, RawEvent};

    use crate::infrastructure::device::mock::MockDeviceBackend;

    fn pad(backend: &MockDeviceBackend, caps: Capabilities) -> VirtualGamepad {
        VirtualGamepad::create(backend, "Test #0", caps).unwrap()
    }

    #[test]
    fn test_decode_string_value() {
        let event = decode(br#"{"k":"abs:x","v":"50","t":"1"}"#).unwrap();
        assert_eq!(
            event,
            InputEvent {
                key: "abs:x".to_string(),
                value: 50,
                time: json!("1"),
            }
        );
    }

    #[test]
    fn test_decode_number_value() {
        let event = decode(br#"{"k":"btn:a","v":1,"t":99}"#).unwrap();
        assert_eq!(event.value, 1);
        assert_eq!(event.time, json!(99));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let raw = br#"{"k":"abs:ry","v":"-42","t":123456}"#;
        assert_eq!(decode(raw).unwrap(), decode(raw).unwrap());
    }

    #[test]
    fn test_decode_rejects_non_numeric_string() {
        let err = decode(br#"{"k":"abs:x","v":"fifty","t":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::NonNumericValue(ref s) if s == "fifty"));
    }

    #[test]
    fn test_decode_rejects_padded_numeric_string() {
        let err = decode(br#"{"k":"abs:x","v":" 5","t":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::NonNumericValue(_)));
    }

    #[test]
    fn test_decode_rejects_value_beyond_i32() {
        let err = decode(br#"{"k":"abs:x","v":"4294967296"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::ValueOutOfRange(4_294_967_296)));
    }

    #[test]
    fn test_decode_rejects_missing_key() {
        let err = decode(br#"{"v":"1","t":1}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(decode(b"not json"), Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn test_apply_axis_writes_abs_event() {
        // Arrange
        let backend = MockDeviceBackend::new();
        let mut device = pad(&backend, Capabilities::SIMPLE_ANALOG);

        // Act
        apply(&mut device, Resolved::Axis(joypad_core::Axis::X), 50).unwrap();

        // Assert
        let events = backend.events(0);
        assert_eq!(
            events,
            vec![
                RawEvent {
                    event_type: EV_ABS,
                    code: ABS_X,
                    value: 50
                },
                RawEvent::sync_report()
            ]
        );
    }

    #[test]
    fn test_apply_button_writes_key_event() {
        let backend = MockDeviceBackend::new();
        let mut device = pad(&backend, Capabilities::SIMPLE_ANALOG);

        apply(&mut device, Resolved::Button(joypad_core::Button::A), 1).unwrap();

        let events = backend.events(0);
        assert_eq!(events[0].event_type, EV_KEY);
        assert_eq!(events[0].code, BTN_A);
        assert!(events[1].is_sync());
    }

    #[test]
    fn test_apply_unknown_is_an_error() {
        let backend = MockDeviceBackend::new();
        let mut device = pad(&backend, Capabilities::FULL);

        let err = apply(&mut device, Resolved::Unknown, 1).unwrap_err();

        assert!(matches!(err, EventError::UnknownKey(_)));
        assert!(backend.events(0).is_empty());
    }

    #[test]
    fn test_dispatcher_returns_ack_with_echoed_time() {
        let backend = MockDeviceBackend::new();
        let mut device = pad(&backend, Capabilities::SIMPLE_ANALOG);
        let dispatcher = EventDispatcher::new(Arc::new(KeyTable::canonical()));

        let ack = dispatcher
            .handle(&mut device, br#"{"k":"abs:x","v":"50","t":"1"}"#)
            .unwrap();

        assert_eq!(ack, AckMsg { t: json!("1") });
    }

    #[test]
    fn test_dispatcher_unknown_key_writes_nothing() {
        let backend = MockDeviceBackend::new();
        let mut device = pad(&backend, Capabilities::FULL);
        let dispatcher = EventDispatcher::new(Arc::new(KeyTable::canonical()));

        let err = dispatcher
            .handle(&mut device, br#"{"k":"bogus","v":"1","t":"4"}"#)
            .unwrap_err();

        assert!(matches!(err, EventError::UnknownKey(ref k) if k == "bogus"));
        assert!(backend.events(0).is_empty());
    }

    #[test]
    fn test_dispatcher_disabled_button_surfaces_device_error() {
        let backend = MockDeviceBackend::new();
        let mut device = pad(&backend, Capabilities::SIMPLE_ANALOG);
        let dispatcher = EventDispatcher::new(Arc::new(KeyTable::canonical()));

        let err = dispatcher
            .handle(&mut device, br#"{"k":"btn:dpad-up","v":"1","t":"5"}"#)
            .unwrap_err();

        assert!(matches!(
            err,
            EventError::Device(DeviceError::ButtonDisabled(joypad_core::Button::DpadUp))
        ));
    }
}
