//! Push-to-talk key naming and trigger encoding
//!
//! `keys` holds the closed sets of modifier and regular keys with their
//! display names; `combo` turns them into the stored trigger string and
//! back.

mod combo;
mod keys;

pub use combo::{
    encode, is_legacy, is_recognized_modifier, is_recognized_regular_key, HotkeySpec,
    HotkeySpecError,
};
pub use keys::{display_name_for, ModifierKey, RegularKey, ESCAPE};
