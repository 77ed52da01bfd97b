//! Axis and button identifiers, plus the key table that maps client-side key
//! identifier strings (`"abs:x"`, `"btn:a"`, ...) onto them.
//!
//! The table is built once at startup and then shared read-only between all
//! connection tasks (typically behind an `Arc`).  There is no process-wide
//! mutable lookup state.

pub mod linux_input;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An absolute-position input channel on the virtual gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Axis {
    /// Left stick, horizontal.
    X,
    /// Left stick, vertical.
    Y,
    /// Right stick, horizontal.
    Rx,
    /// Right stick, vertical.
    Ry,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::X, Axis::Y, Axis::Rx, Axis::Ry];

    /// Linux `ABS_*` event code for this axis.
    pub fn code(self) -> u16 {
        linux_input::axis_code(self)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Rx => "rx",
            Axis::Ry => "ry",
        };
        f.write_str(name)
    }
}

/// A discrete input channel on the virtual gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Button {
    A,
    B,
    X,
    Y,
    Start,
    Select,
    Forward,
    Back,
    Left,
    Right,
    DpadUp,
    DpadDown,
    DpadLeft,
    DpadRight,
}

impl Button {
    pub const ALL: [Button; 14] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Start,
        Button::Select,
        Button::Forward,
        Button::Back,
        Button::Left,
        Button::Right,
        Button::DpadUp,
        Button::DpadDown,
        Button::DpadLeft,
        Button::DpadRight,
    ];

    /// Linux `BTN_*` event code for this button.
    pub fn code(self) -> u16 {
        linux_input::button_code(self)
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Button::A => "a",
            Button::B => "b",
            Button::X => "x",
            Button::Y => "y",
            Button::Start => "start",
            Button::Select => "select",
            Button::Forward => "forward",
            Button::Back => "back",
            Button::Left => "left",
            Button::Right => "right",
            Button::DpadUp => "dpad-up",
            Button::DpadDown => "dpad-down",
            Button::DpadLeft => "dpad-left",
            Button::DpadRight => "dpad-right",
        };
        f.write_str(name)
    }
}

/// The outcome of looking up a key identifier in a [`KeyTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Axis(Axis),
    Button(Button),
    /// The identifier is not in the table.  Callers drop the event.
    Unknown,
}

/// Errors raised while assembling a custom [`KeyTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyTableError {
    /// The same identifier was mapped to both an axis and a button.
    #[error("key identifier '{0}' is mapped to both an axis and a button")]
    Ambiguous(String),

    #[error("key identifier must not be empty")]
    EmptyIdentifier,
}

/// Immutable mapping from key identifier strings to axes and buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyTable {
    axes: HashMap<String, Axis>,
    buttons: HashMap<String, Button>,
}

impl KeyTable {
    /// The canonical identifier set understood by the bundled web client.
    pub fn canonical() -> Self {
        let axes = Axis::ALL
            .iter()
            .map(|axis| (format!("abs:{axis}"), *axis))
            .collect();
        let buttons = Button::ALL
            .iter()
            .map(|button| (format!("btn:{button}"), *button))
            .collect();
        Self { axes, buttons }
    }

    /// Builds a table from explicit axis and button mappings.
    ///
    /// # Errors
    ///
    /// Returns [`KeyTableError::Ambiguous`] if an identifier appears in both
    /// maps, or [`KeyTableError::EmptyIdentifier`] for an empty key.
    pub fn from_parts(
        axes: HashMap<String, Axis>,
        buttons: HashMap<String, Button>,
    ) -> Result<Self, KeyTableError> {
        if axes.keys().chain(buttons.keys()).any(|k| k.is_empty()) {
            return Err(KeyTableError::EmptyIdentifier);
        }
        if let Some(key) = axes.keys().find(|k| buttons.contains_key(*k)) {
            return Err(KeyTableError::Ambiguous(key.clone()));
        }
        Ok(Self { axes, buttons })
    }

    /// Looks up a key identifier.  Matching is exact and case-sensitive.
    pub fn resolve(&self, key: &str) -> Resolved {
        if let Some(axis) = self.axes.get(key) {
            Resolved::Axis(*axis)
        } else if let Some(button) = self.buttons.get(key) {
            Resolved::Button(*button)
        } else {
            Resolved::Unknown
        }
    }

    /// Total number of identifiers in the table.
    pub fn len(&self) -> usize {
        self.axes.len() + self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KeyTable {
    fn default() -> Self {
        Self::canonical()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
