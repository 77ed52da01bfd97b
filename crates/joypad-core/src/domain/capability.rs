//! Capability flags describing which axes and buttons a virtual gamepad exposes.
//!
//! A capability set is chosen once, when the device is created, and never
//! changes afterwards.  Base flags each enable a small group of related
//! channels; presets are unions of base flags.
//!
//! | Flag          | Enables                                         |
//! |---------------|-------------------------------------------------|
//! | `LEFT_STICK`  | `ABS_X`, `ABS_Y`                                |
//! | `RIGHT_STICK` | `ABS_RX`, `ABS_RY`                              |
//! | `START`       | `BTN_START`                                     |
//! | `SELECT`      | `BTN_SELECT`                                    |
//! | `AB`          | `BTN_A`, `BTN_B`                                |
//! | `XY`          | `BTN_X`, `BTN_Y`                                |
//! | `DPAD`        | `BTN_DPAD_UP/DOWN/LEFT/RIGHT`                   |
//! | `NAV`         | `BTN_FORWARD`, `BTN_BACK`, `BTN_LEFT`, `BTN_RIGHT` |

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::keymap::{Axis, Button};

/// A composable bitset of gamepad features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities(pub u16);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    pub const LEFT_STICK: Capabilities = Capabilities(1 << 0);
    pub const RIGHT_STICK: Capabilities = Capabilities(1 << 1);
    pub const START: Capabilities = Capabilities(1 << 2);
    pub const SELECT: Capabilities = Capabilities(1 << 3);
    pub const AB: Capabilities = Capabilities(1 << 4);
    pub const XY: Capabilities = Capabilities(1 << 5);
    pub const DPAD: Capabilities = Capabilities(1 << 6);
    pub const NAV: Capabilities = Capabilities(1 << 7);

    /// D-pad, A/B and start/select: a classic 8-bit layout.
    pub const SIMPLE_DPAD: Capabilities =
        Capabilities(Self::DPAD.0 | Self::START.0 | Self::SELECT.0 | Self::AB.0);

    /// One analog stick, A/B and start/select.
    pub const SIMPLE_ANALOG: Capabilities =
        Capabilities(Self::LEFT_STICK.0 | Self::START.0 | Self::SELECT.0 | Self::AB.0);

    /// Every base flag.
    pub const FULL: Capabilities = Capabilities(
        Self::LEFT_STICK.0
            | Self::RIGHT_STICK.0
            | Self::START.0
            | Self::SELECT.0
            | Self::AB.0
            | Self::XY.0
            | Self::DPAD.0
            | Self::NAV.0,
    );

    /// Returns `true` if every bit of `feature` is set.
    pub fn has(self, feature: Capabilities) -> bool {
        self.0 & feature.0 == feature.0
    }

    /// Axes implied by this capability set, in a stable order.
    pub fn axes(self) -> Vec<Axis> {
        let mut axes = Vec::new();
        if self.has(Self::LEFT_STICK) {
            axes.extend([Axis::X, Axis::Y]);
        }
        if self.has(Self::RIGHT_STICK) {
            axes.extend([Axis::Rx, Axis::Ry]);
        }
        axes
    }

    /// Buttons implied by this capability set, in a stable order.
    pub fn buttons(self) -> Vec<Button> {
        let mut buttons = Vec::new();
        if self.has(Self::START) {
            buttons.push(Button::Start);
        }
        if self.has(Self::SELECT) {
            buttons.push(Button::Select);
        }
        if self.has(Self::AB) {
            buttons.extend([Button::A, Button::B]);
        }
        if self.has(Self::XY) {
            buttons.extend([Button::X, Button::Y]);
        }
        if self.has(Self::DPAD) {
            buttons.extend([
                Button::DpadUp,
                Button::DpadDown,
                Button::DpadLeft,
                Button::DpadRight,
            ]);
        }
        if self.has(Self::NAV) {
            buttons.extend([Button::Forward, Button::Back, Button::Left, Button::Right]);
        }
        buttons
    }

    pub fn enables_axis(self, axis: Axis) -> bool {
        self.has(Self::feature_of_axis(axis))
    }

    pub fn enables_button(self, button: Button) -> bool {
        self.has(Self::feature_of_button(button))
    }

    /// The base flag that enables `axis`.
    pub fn feature_of_axis(axis: Axis) -> Capabilities {
        match axis {
            Axis::X | Axis::Y => Self::LEFT_STICK,
            Axis::Rx | Axis::Ry => Self::RIGHT_STICK,
        }
    }

    /// The base flag that enables `button`.
    pub fn feature_of_button(button: Button) -> Capabilities {
        match button {
            Button::Start => Self::START,
            Button::Select => Self::SELECT,
            Button::A | Button::B => Self::AB,
            Button::X | Button::Y => Self::XY,
            Button::DpadUp | Button::DpadDown | Button::DpadLeft | Button::DpadRight => Self::DPAD,
            Button::Forward | Button::Back | Button::Left | Button::Right => Self::NAV,
        }
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Self) -> Self::Output {
        Capabilities(self.0 | rhs.0)
    }
}

/// Named capability presets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPreset {
    SimpleDpad,
    SimpleAnalog,
    Full,
}

impl LayoutPreset {
    pub fn capabilities(self) -> Capabilities {
        match self {
            LayoutPreset::SimpleDpad => Capabilities::SIMPLE_DPAD,
            LayoutPreset::SimpleAnalog => Capabilities::SIMPLE_ANALOG,
            LayoutPreset::Full => Capabilities::FULL,
        }
    }
}

impl fmt::Display for LayoutPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayoutPreset::SimpleDpad => "simple-dpad",
            LayoutPreset::SimpleAnalog => "simple-analog",
            LayoutPreset::Full => "full",
        })
    }
}

impl FromStr for LayoutPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple-dpad" => Ok(LayoutPreset::SimpleDpad),
            "simple-analog" => Ok(LayoutPreset::SimpleAnalog),
            "full" => Ok(LayoutPreset::Full),
            other => Err(format!(
                "unknown layout '{other}' (expected simple-dpad, simple-analog or full)"
            )),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const BASE_FLAGS: [Capabilities; 8] = [
        Capabilities::LEFT_STICK,
        Capabilities::RIGHT_STICK,
        Capabilities::START,
        Capabilities::SELECT,
        Capabilities::AB,
        Capabilities::XY,
        Capabilities::DPAD,
        Capabilities::NAV,
    ];

    fn expected_axes(flag: Capabilities) -> Vec<Axis> {
        match flag {
            Capabilities::LEFT_STICK => vec![Axis::X, Axis::Y],
            Capabilities::RIGHT_STICK => vec![Axis::Rx, Axis::Ry],
            _ => vec![],
        }
    }

    fn expected_buttons(flag: Capabilities) -> Vec<Button> {
        match flag {
            Capabilities::START => vec![Button::Start],
            Capabilities::SELECT => vec![Button::Select],
            Capabilities::AB => vec![Button::A, Button::B],
            Capabilities::XY => vec![Button::X, Button::Y],
            Capabilities::DPAD => vec![
                Button::DpadUp,
                Button::DpadDown,
                Button::DpadLeft,
                Button::DpadRight,
            ],
            Capabilities::NAV => vec![Button::Forward, Button::Back, Button::Left, Button::Right],
            _ => vec![],
        }
    }

    #[test]
    fn test_has_is_a_pure_bit_test() {
        let caps = Capabilities::AB | Capabilities::START;
        assert!(caps.has(Capabilities::AB));
        assert!(caps.has(Capabilities::START));
        assert!(!caps.has(Capabilities::XY));
        // A composite is only present when all of its bits are.
        assert!(!caps.has(Capabilities::SIMPLE_DPAD));
        assert!(caps.has(Capabilities::NONE));
    }

    #[test]
    fn test_every_flag_combination_enables_exactly_the_implied_union() {
        // Walk all 256 subsets of the base flags.
        for mask in 0u16..(1 << BASE_FLAGS.len()) {
            let mut caps = Capabilities::NONE;
            let mut axes = HashSet::new();
            let mut buttons = HashSet::new();
            for (bit, flag) in BASE_FLAGS.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    caps = caps | *flag;
                    axes.extend(expected_axes(*flag));
                    buttons.extend(expected_buttons(*flag));
                }
            }

            let got_axes: HashSet<Axis> = caps.axes().into_iter().collect();
            let got_buttons: HashSet<Button> = caps.buttons().into_iter().collect();
            assert_eq!(got_axes, axes, "axes mismatch for mask {mask:#x}");
            assert_eq!(got_buttons, buttons, "buttons mismatch for mask {mask:#x}");
            // No duplicates either.
            assert_eq!(caps.axes().len(), axes.len());
            assert_eq!(caps.buttons().len(), buttons.len());
        }
    }

    #[test]
    fn test_enables_agrees_with_enumeration() {
        for mask in 0u16..=0xff {
            let caps = Capabilities(mask);
            for axis in Axis::ALL {
                assert_eq!(caps.enables_axis(axis), caps.axes().contains(&axis));
            }
            for button in Button::ALL {
                assert_eq!(caps.enables_button(button), caps.buttons().contains(&button));
            }
        }
    }

    #[test]
    fn test_presets_include_both_face_buttons() {
        for preset in [
            Capabilities::SIMPLE_DPAD,
            Capabilities::SIMPLE_ANALOG,
            Capabilities::FULL,
        ] {
            assert!(preset.enables_button(Button::A));
            assert!(preset.enables_button(Button::B));
        }
    }

    #[test]
    fn test_simple_analog_has_left_stick_only() {
        let caps = Capabilities::SIMPLE_ANALOG;
        assert_eq!(caps.axes(), vec![Axis::X, Axis::Y]);
        assert!(!caps.enables_axis(Axis::Rx));
        assert!(!caps.enables_button(Button::DpadUp));
    }

    #[test]
    fn test_simple_dpad_has_no_axes() {
        let caps = Capabilities::SIMPLE_DPAD;
        assert!(caps.axes().is_empty());
        assert!(caps.enables_button(Button::DpadLeft));
    }

    #[test]
    fn test_full_enables_every_axis_and_button() {
        assert_eq!(Capabilities::FULL.axes().len(), Axis::ALL.len());
        assert_eq!(Capabilities::FULL.buttons().len(), Button::ALL.len());
    }

    #[test]
    fn test_layout_preset_parses_and_displays() {
        for preset in [
            LayoutPreset::SimpleDpad,
            LayoutPreset::SimpleAnalog,
            LayoutPreset::Full,
        ] {
            assert_eq!(preset.to_string().parse::<LayoutPreset>(), Ok(preset));
        }
        assert!("arcade".parse::<LayoutPreset>().is_err());
    }
}
