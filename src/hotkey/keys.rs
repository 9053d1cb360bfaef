//! Key identifiers and their display names
//!
//! Two closed sets of physical keys can take part in a push-to-talk trigger:
//! modifiers (which every trigger has exactly one of) and regular keys (the
//! optional second half of a combo). Identifiers are the raw key codes a
//! keyboard event reports (`AltLeft`, `KeyD`, `Digit4`, ...).
//!
//! Older settings files stored modifiers under lowercase word names
//! (`left_option`). Those legacy names are still understood when reading,
//! but nothing in this crate produces them.

use std::fmt;

/// Identifier a keyboard event reports for the Escape key
pub const ESCAPE: &str = "Escape";

/// Separator between the modifier and the regular key of a combo
pub const COMBO_SEPARATOR: char = '+';

/// A modifier key that can anchor a push-to-talk trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierKey {
    /// Left Alt / Option
    AltLeft,
    /// Right Alt / Option
    AltRight,
    /// Left Meta / Command
    MetaLeft,
    /// Right Meta / Command
    MetaRight,
    /// Left Shift
    ShiftLeft,
    /// Right Shift
    ShiftRight,
    /// Left Control
    ControlLeft,
    /// Right Control
    ControlRight,
}

impl ModifierKey {
    /// Every modifier, in display order
    pub const ALL: [ModifierKey; 8] = [
        ModifierKey::AltLeft,
        ModifierKey::AltRight,
        ModifierKey::MetaLeft,
        ModifierKey::MetaRight,
        ModifierKey::ShiftLeft,
        ModifierKey::ShiftRight,
        ModifierKey::ControlLeft,
        ModifierKey::ControlRight,
    ];

    /// Raw key identifier, the form persisted in settings
    pub fn code(self) -> &'static str {
        match self {
            ModifierKey::AltLeft => "AltLeft",
            ModifierKey::AltRight => "AltRight",
            ModifierKey::MetaLeft => "MetaLeft",
            ModifierKey::MetaRight => "MetaRight",
            ModifierKey::ShiftLeft => "ShiftLeft",
            ModifierKey::ShiftRight => "ShiftRight",
            ModifierKey::ControlLeft => "ControlLeft",
            ModifierKey::ControlRight => "ControlRight",
        }
    }

    /// Name older versions persisted for this modifier
    pub fn legacy_name(self) -> &'static str {
        match self {
            ModifierKey::AltLeft => "left_option",
            ModifierKey::AltRight => "right_option",
            ModifierKey::MetaLeft => "left_command",
            ModifierKey::MetaRight => "right_command",
            ModifierKey::ShiftLeft => "left_shift",
            ModifierKey::ShiftRight => "right_shift",
            ModifierKey::ControlLeft => "left_control",
            ModifierKey::ControlRight => "right_control",
        }
    }

    /// Human-readable label
    pub fn display_name(self) -> &'static str {
        match self {
            ModifierKey::AltLeft => "Left Option",
            ModifierKey::AltRight => "Right Option",
            ModifierKey::MetaLeft => "Left Command",
            ModifierKey::MetaRight => "Right Command",
            ModifierKey::ShiftLeft => "Left Shift",
            ModifierKey::ShiftRight => "Right Shift",
            ModifierKey::ControlLeft => "Left Control",
            ModifierKey::ControlRight => "Right Control",
        }
    }

    /// Look up a modifier by its raw key identifier
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Look up a modifier by its legacy name
    pub fn from_legacy(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.legacy_name() == name)
    }

    /// Look up a modifier by either its current or its legacy identifier
    pub fn from_any(identifier: &str) -> Option<Self> {
        Self::from_code(identifier).or_else(|| Self::from_legacy(identifier))
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A non-modifier key accepted as the second half of a combo
///
/// Only letters, digits, Space, Tab and Enter are accepted. Punctuation,
/// arrows and function keys are not part of the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegularKey {
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
    KeyG,
    KeyH,
    KeyI,
    KeyJ,
    KeyK,
    KeyL,
    KeyM,
    KeyN,
    KeyO,
    KeyP,
    KeyQ,
    KeyR,
    KeyS,
    KeyT,
    KeyU,
    KeyV,
    KeyW,
    KeyX,
    KeyY,
    KeyZ,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Space,
    Tab,
    Enter,
}

impl RegularKey {
    /// Every regular key
    pub const ALL: [RegularKey; 39] = [
        RegularKey::KeyA,
        RegularKey::KeyB,
        RegularKey::KeyC,
        RegularKey::KeyD,
        RegularKey::KeyE,
        RegularKey::KeyF,
        RegularKey::KeyG,
        RegularKey::KeyH,
        RegularKey::KeyI,
        RegularKey::KeyJ,
        RegularKey::KeyK,
        RegularKey::KeyL,
        RegularKey::KeyM,
        RegularKey::KeyN,
        RegularKey::KeyO,
        RegularKey::KeyP,
        RegularKey::KeyQ,
        RegularKey::KeyR,
        RegularKey::KeyS,
        RegularKey::KeyT,
        RegularKey::KeyU,
        RegularKey::KeyV,
        RegularKey::KeyW,
        RegularKey::KeyX,
        RegularKey::KeyY,
        RegularKey::KeyZ,
        RegularKey::Digit0,
        RegularKey::Digit1,
        RegularKey::Digit2,
        RegularKey::Digit3,
        RegularKey::Digit4,
        RegularKey::Digit5,
        RegularKey::Digit6,
        RegularKey::Digit7,
        RegularKey::Digit8,
        RegularKey::Digit9,
        RegularKey::Space,
        RegularKey::Tab,
        RegularKey::Enter,
    ];

    /// Raw key identifier
    pub fn code(self) -> &'static str {
        match self {
            RegularKey::KeyA => "KeyA",
            RegularKey::KeyB => "KeyB",
            RegularKey::KeyC => "KeyC",
            RegularKey::KeyD => "KeyD",
            RegularKey::KeyE => "KeyE",
            RegularKey::KeyF => "KeyF",
            RegularKey::KeyG => "KeyG",
            RegularKey::KeyH => "KeyH",
            RegularKey::KeyI => "KeyI",
            RegularKey::KeyJ => "KeyJ",
            RegularKey::KeyK => "KeyK",
            RegularKey::KeyL => "KeyL",
            RegularKey::KeyM => "KeyM",
            RegularKey::KeyN => "KeyN",
            RegularKey::KeyO => "KeyO",
            RegularKey::KeyP => "KeyP",
            RegularKey::KeyQ => "KeyQ",
            RegularKey::KeyR => "KeyR",
            RegularKey::KeyS => "KeyS",
            RegularKey::KeyT => "KeyT",
            RegularKey::KeyU => "KeyU",
            RegularKey::KeyV => "KeyV",
            RegularKey::KeyW => "KeyW",
            RegularKey::KeyX => "KeyX",
            RegularKey::KeyY => "KeyY",
            RegularKey::KeyZ => "KeyZ",
            RegularKey::Digit0 => "Digit0",
            RegularKey::Digit1 => "Digit1",
            RegularKey::Digit2 => "Digit2",
            RegularKey::Digit3 => "Digit3",
            RegularKey::Digit4 => "Digit4",
            RegularKey::Digit5 => "Digit5",
            RegularKey::Digit6 => "Digit6",
            RegularKey::Digit7 => "Digit7",
            RegularKey::Digit8 => "Digit8",
            RegularKey::Digit9 => "Digit9",
            RegularKey::Space => "Space",
            RegularKey::Tab => "Tab",
            RegularKey::Enter => "Enter",
        }
    }

    /// Human-readable label: the bare letter or digit, or the key's name
    pub fn display_name(self) -> &'static str {
        let code = self.code();
        code.strip_prefix("Key")
            .or_else(|| code.strip_prefix("Digit"))
            .unwrap_or(code)
    }

    /// Look up a regular key by its raw key identifier
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }
}

impl fmt::Display for RegularKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolve a single identifier: current modifier, then legacy modifier,
/// then regular key
fn lookup_display(identifier: &str) -> Option<&'static str> {
    ModifierKey::from_code(identifier)
        .or_else(|| ModifierKey::from_legacy(identifier))
        .map(ModifierKey::display_name)
        .or_else(|| RegularKey::from_code(identifier).map(RegularKey::display_name))
}

fn display_part(identifier: &str) -> &str {
    lookup_display(identifier).unwrap_or(identifier)
}

/// Human-readable label for a stored trigger value
///
/// Accepts a single identifier or a `modifier+key` combo, in current or
/// legacy form. Anything unknown is passed through unchanged.
pub fn display_name_for(raw: &str) -> String {
    match raw.split_once(COMBO_SEPARATOR) {
        Some((modifier, key)) => {
            format!("{} + {}", display_part(modifier), display_part(key))
        }
        None => display_part(raw).to_owned(),
    }
}
