//! Encoding and decoding of push-to-talk trigger values
//!
//! A trigger is stored as a single string: the modifier's raw identifier,
//! optionally followed by `+` and a regular key's raw identifier
//! (`AltLeft`, `AltLeft+KeyD`). Encoding always produces this current form.
//! Decoding also accepts legacy modifier names so old settings keep working.

use std::fmt;
use std::str::FromStr;

use super::keys::{display_name_for, ModifierKey, RegularKey, COMBO_SEPARATOR};

/// Errors from strict decoding of a stored trigger value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HotkeySpecError {
    #[error("hotkey value is empty")]
    Empty,

    #[error("unknown modifier key: {0}")]
    UnknownModifier(String),

    #[error("unsupported combo key: {0}")]
    UnknownKey(String),
}

/// A configured push-to-talk trigger: one modifier, at most one regular key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeySpec {
    /// The modifier that must be held
    pub modifier: ModifierKey,
    /// The key pressed together with the modifier, for combo triggers
    pub regular_key: Option<RegularKey>,
}

impl Default for HotkeySpec {
    fn default() -> Self {
        Self::modifier_only(ModifierKey::AltLeft)
    }
}

impl HotkeySpec {
    /// A trigger that is just a modifier
    pub fn modifier_only(modifier: ModifierKey) -> Self {
        Self {
            modifier,
            regular_key: None,
        }
    }

    /// A modifier + regular key trigger
    pub fn combo(modifier: ModifierKey, key: RegularKey) -> Self {
        Self {
            modifier,
            regular_key: Some(key),
        }
    }

    /// Whether a regular key is part of this trigger
    pub fn is_combo(&self) -> bool {
        self.regular_key.is_some()
    }

    /// Canonical stored form
    pub fn encode(&self) -> String {
        encode(self.modifier, self.regular_key)
    }

    /// Human-readable label, e.g. `Left Option + D`
    pub fn display_name(&self) -> String {
        display_name_for(&self.encode())
    }

    /// Decode a stored value the way the global listener does
    ///
    /// Never fails: an unrecognized modifier falls back to Left Option and an
    /// unrecognized regular key falls back to a modifier-only trigger.
    /// `Return` is treated as `Enter`.
    pub fn resolve(raw: &str) -> Self {
        let (modifier_part, key_part) = match raw.split_once(COMBO_SEPARATOR) {
            Some((modifier, key)) => (modifier, Some(key)),
            None => (raw, None),
        };

        let modifier = ModifierKey::from_any(modifier_part).unwrap_or(ModifierKey::AltLeft);
        let regular_key = key_part.and_then(resolve_regular_key);

        Self {
            modifier,
            regular_key,
        }
    }
}

impl fmt::Display for HotkeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.modifier.code())?;
        if let Some(key) = self.regular_key {
            write!(f, "{}{}", COMBO_SEPARATOR, key.code())?;
        }
        Ok(())
    }
}

impl FromStr for HotkeySpec {
    type Err = HotkeySpecError;

    /// Strict decode; accepts current and legacy modifier identifiers
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(HotkeySpecError::Empty);
        }

        let (modifier_part, key_part) = match s.split_once(COMBO_SEPARATOR) {
            Some((modifier, key)) => (modifier, Some(key)),
            None => (s, None),
        };

        let modifier = ModifierKey::from_any(modifier_part)
            .ok_or_else(|| HotkeySpecError::UnknownModifier(modifier_part.to_owned()))?;

        let regular_key = match key_part {
            Some(key) => Some(
                RegularKey::from_code(key)
                    .ok_or_else(|| HotkeySpecError::UnknownKey(key.to_owned()))?,
            ),
            None => None,
        };

        Ok(Self {
            modifier,
            regular_key,
        })
    }
}

fn resolve_regular_key(code: &str) -> Option<RegularKey> {
    match code {
        "Return" => Some(RegularKey::Enter),
        other => RegularKey::from_code(other),
    }
}

/// Encode a trigger as `modifier` or `modifier+key`
pub fn encode(modifier: ModifierKey, regular_key: Option<RegularKey>) -> String {
    match regular_key {
        Some(key) => format!("{}{}{}", modifier.code(), COMBO_SEPARATOR, key.code()),
        None => modifier.code().to_owned(),
    }
}

/// Whether a key event identifier can anchor a trigger
///
/// Only raw identifiers count; legacy names never arrive from a keyboard.
pub fn is_recognized_modifier(code: &str) -> bool {
    ModifierKey::from_code(code).is_some()
}

/// Whether a key event identifier can complete a combo
pub fn is_recognized_regular_key(code: &str) -> bool {
    RegularKey::from_code(code).is_some()
}

/// Whether a stored value still uses a legacy modifier name
pub fn is_legacy(raw: &str) -> bool {
    let modifier = raw
        .split_once(COMBO_SEPARATOR)
        .map_or(raw, |(modifier, _)| modifier);
    ModifierKey::from_legacy(modifier).is_some()
}
