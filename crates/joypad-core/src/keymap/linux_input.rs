//! Linux input event type and code constants.
//!
//! Values are taken from `include/uapi/linux/input-event-codes.h`.
//! Reference: https://github.com/torvalds/linux/blob/master/include/uapi/linux/input-event-codes.h
//!
//! Only the subset needed by the virtual gamepad is listed here.  Keeping the
//! numbers in this crate (rather than importing them from an evdev binding)
//! lets the capability model and key table stay free of OS dependencies.

use super::{Axis, Button};

// ── Event types ───────────────────────────────────────────────────────────────

/// Synchronization events (frame markers).
pub const EV_SYN: u16 = 0x00;
/// Key and button state changes.
pub const EV_KEY: u16 = 0x01;
/// Absolute axis values.
pub const EV_ABS: u16 = 0x03;

/// Terminates one atomic frame of axis/button changes.
pub const SYN_REPORT: u16 = 0x00;

// ── Absolute axes ─────────────────────────────────────────────────────────────

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_RX: u16 = 0x03;
pub const ABS_RY: u16 = 0x04;

// ── Buttons ───────────────────────────────────────────────────────────────────

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_FORWARD: u16 = 0x115;
pub const BTN_BACK: u16 = 0x116;

pub const BTN_A: u16 = 0x130; // BTN_SOUTH
pub const BTN_B: u16 = 0x131; // BTN_EAST
pub const BTN_X: u16 = 0x133; // BTN_NORTH
pub const BTN_Y: u16 = 0x134; // BTN_WEST
pub const BTN_SELECT: u16 = 0x13a;
pub const BTN_START: u16 = 0x13b;

pub const BTN_DPAD_UP: u16 = 0x220;
pub const BTN_DPAD_DOWN: u16 = 0x221;
pub const BTN_DPAD_LEFT: u16 = 0x222;
pub const BTN_DPAD_RIGHT: u16 = 0x223;

/// Translates an [`Axis`] to its `ABS_*` code.
pub fn axis_code(axis: Axis) -> u16 {
    match axis {
        Axis::X => ABS_X,
        Axis::Y => ABS_Y,
        Axis::Rx => ABS_RX,
        Axis::Ry => ABS_RY,
    }
}

/// Translates a [`Button`] to its `BTN_*` code.
pub fn button_code(button: Button) -> u16 {
    match button {
        Button::A => BTN_A,
        Button::B => BTN_B,
        Button::X => BTN_X,
        Button::Y => BTN_Y,
        Button::Start => BTN_START,
        Button::Select => BTN_SELECT,
        Button::Forward => BTN_FORWARD,
        Button::Back => BTN_BACK,
        Button::Left => BTN_LEFT,
        Button::Right => BTN_RIGHT,
        Button::DpadUp => BTN_DPAD_UP,
        Button::DpadDown => BTN_DPAD_DOWN,
        Button::DpadLeft => BTN_DPAD_LEFT,
        Button::DpadRight => BTN_DPAD_RIGHT,
    }
}
