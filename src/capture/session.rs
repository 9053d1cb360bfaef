//! Recording state machine for a push-to-talk trigger
//!
//! Transitions are a pure function from the current session and one input
//! to the next session plus a list of effects. Applying the effects (pausing
//! the global listener, updating the control's label, persisting the value)
//! is the caller's job, so the machine runs without a live UI.
//!
//! Idle --activate--> AwaitingModifier --modifier down--> AwaitingCombo
//! AwaitingCombo --regular key down--> Idle (commit modifier+key)
//! AwaitingCombo --modifier up--> Idle (commit modifier only)
//! any active phase --Escape / activate--> Idle (cancel)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hotkey::{HotkeySpec, ModifierKey, RegularKey, ESCAPE};

/// Phase of a capture session, without its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePhase {
    /// Not recording
    #[default]
    Idle,
    /// Recording, waiting for a modifier to be pressed
    AwaitingModifier,
    /// A modifier is held, waiting for a regular key or the modifier's release
    AwaitingCombo,
}

impl fmt::Display for CapturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapturePhase::Idle => write!(f, "Idle"),
            CapturePhase::AwaitingModifier => write!(f, "AwaitingModifier"),
            CapturePhase::AwaitingCombo => write!(f, "AwaitingCombo"),
        }
    }
}

/// One recording session of a capture control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureSession {
    /// Not recording
    #[default]
    Idle,
    /// Recording, no modifier pressed yet
    AwaitingModifier,
    /// Recording with `modifier` held
    AwaitingCombo {
        /// The modifier pressed first
        modifier: ModifierKey,
    },
}

/// Something that happened to the capture control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureInput<'a> {
    /// The user clicked the capture control
    Activate,
    /// A key went down; carries the raw key identifier
    KeyDown(&'a str),
    /// A key went up; carries the raw key identifier
    KeyUp(&'a str),
}

/// Label prompts shown on the control while recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    /// Ask for a modifier
    HoldModifier,
    /// Ask for a combo key, or a release to keep the modifier alone
    PressKeyOrRelease,
}

impl Prompt {
    /// Text shown on the control
    pub fn text(self) -> &'static str {
        match self {
            Prompt::HoldModifier => "Hold a modifier key\u{2026}",
            Prompt::PressKeyOrRelease => "Now press a key, or release to use the modifier alone",
        }
    }
}

/// Side effects requested by a transition, in the order they must be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Stop the key event from reaching anything else
    ConsumeKey,
    /// Ask the backend to suspend global hotkey matching
    PauseListener,
    /// Ask the backend to resume global hotkey matching
    ResumeListener,
    /// Show a recording prompt and the recording style
    ShowPrompt(Prompt),
    /// Show the current trigger's label and drop the recording style
    ShowCurrent,
    /// A modifier was accepted
    ModifierCaptured(ModifierKey),
    /// Replace the configured trigger
    Commit(HotkeySpec),
    /// Recording ended with the configured trigger untouched
    Cancel,
}

/// Result of feeding one input to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Session after the input
    pub session: CaptureSession,
    /// Effects to apply, in order
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(session: CaptureSession, effects: Vec<Effect>) -> Self {
        Self { session, effects }
    }

    fn commit(spec: HotkeySpec, consumed: bool) -> Self {
        let mut effects = Vec::with_capacity(4);
        if consumed {
            effects.push(Effect::ConsumeKey);
        }
        effects.extend([Effect::Commit(spec), Effect::ResumeListener, Effect::ShowCurrent]);
        Self::stay(CaptureSession::Idle, effects)
    }

    fn cancel(consumed: bool) -> Self {
        let mut effects = Vec::with_capacity(4);
        if consumed {
            effects.push(Effect::ConsumeKey);
        }
        effects.extend([Effect::Cancel, Effect::ResumeListener, Effect::ShowCurrent]);
        Self::stay(CaptureSession::Idle, effects)
    }
}

impl CaptureSession {
    /// Current phase
    pub fn phase(&self) -> CapturePhase {
        match self {
            CaptureSession::Idle => CapturePhase::Idle,
            CaptureSession::AwaitingModifier => CapturePhase::AwaitingModifier,
            CaptureSession::AwaitingCombo { .. } => CapturePhase::AwaitingCombo,
        }
    }

    /// Whether a recording is in progress
    pub fn is_recording(&self) -> bool {
        !matches!(self, CaptureSession::Idle)
    }

    /// Modifier held so far; only set while awaiting the combo key
    pub fn captured_modifier(&self) -> Option<ModifierKey> {
        match self {
            CaptureSession::AwaitingCombo { modifier } => Some(*modifier),
            _ => None,
        }
    }

    /// Feed one input to the session
    pub fn step(self, input: CaptureInput<'_>) -> Transition {
        match (self, input) {
            (CaptureSession::Idle, CaptureInput::Activate) => Transition::stay(
                CaptureSession::AwaitingModifier,
                vec![Effect::PauseListener, Effect::ShowPrompt(Prompt::HoldModifier)],
            ),

            // Clicking the control again while recording abandons it
            (_, CaptureInput::Activate) => Transition::cancel(false),

            // Keys only matter while recording
            (CaptureSession::Idle, _) => Transition::stay(self, Vec::new()),

            (_, CaptureInput::KeyDown(code)) if code == ESCAPE => Transition::cancel(true),

            (CaptureSession::AwaitingModifier, CaptureInput::KeyDown(code)) => {
                match ModifierKey::from_code(code) {
                    Some(modifier) => Transition::stay(
                        CaptureSession::AwaitingCombo { modifier },
                        vec![
                            Effect::ConsumeKey,
                            Effect::ModifierCaptured(modifier),
                            Effect::ShowPrompt(Prompt::PressKeyOrRelease),
                        ],
                    ),
                    None => Transition::stay(self, vec![Effect::ConsumeKey]),
                }
            }

            (CaptureSession::AwaitingCombo { modifier }, CaptureInput::KeyDown(code)) => {
                match RegularKey::from_code(code) {
                    Some(key) => Transition::commit(HotkeySpec::combo(modifier, key), true),
                    None => Transition::stay(self, vec![Effect::ConsumeKey]),
                }
            }

            (CaptureSession::AwaitingCombo { modifier }, CaptureInput::KeyUp(code))
                if code == modifier.code() =>
            {
                Transition::commit(HotkeySpec::modifier_only(modifier), false)
            }

            (_, CaptureInput::KeyUp(_)) => Transition::stay(self, Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(inputs: &[CaptureInput<'_>]) -> (CaptureSession, Vec<Effect>) {
        let mut session = CaptureSession::default();
        let mut effects = Vec::new();
        for input in inputs {
            let transition = session.step(*input);
            session = transition.session;
            effects.extend(transition.effects);
        }
        (session, effects)
    }

    fn committed(effects: &[Effect]) -> Option<HotkeySpec> {
        effects.iter().find_map(|e| match e {
            Effect::Commit(spec) => Some(*spec),
            _ => None,
        })
    }

    #[test]
    fn test_initial_state() {
        let session = CaptureSession::default();
        assert_eq!(session.phase(), CapturePhase::Idle);
        assert!(!session.is_recording());
        assert_eq!(session.captured_modifier(), None);
    }

    #[test]
    fn test_activate_pauses_listener() {
        let t = CaptureSession::Idle.step(CaptureInput::Activate);
        assert_eq!(t.session, CaptureSession::AwaitingModifier);
        assert_eq!(
            t.effects,
            vec![Effect::PauseListener, Effect::ShowPrompt(Prompt::HoldModifier)]
        );
    }

    #[test]
    fn test_modifier_then_regular_key_commits_combo() {
        let (session, effects) = run(&[
            CaptureInput::Activate,
            CaptureInput::KeyDown("AltLeft"),
            CaptureInput::KeyDown("KeyD"),
        ]);
        assert_eq!(session, CaptureSession::Idle);
        let spec = committed(&effects).unwrap();
        assert_eq!(spec.encode(), "AltLeft+KeyD");
        assert_eq!(spec.display_name(), "Left Option + D");
    }

    #[test]
    fn test_modifier_release_commits_modifier_only() {
        let (session, effects) = run(&[
            CaptureInput::Activate,
            CaptureInput::KeyDown("ControlLeft"),
            CaptureInput::KeyUp("ControlLeft"),
        ]);
        assert_eq!(session, CaptureSession::Idle);
        let spec = committed(&effects).unwrap();
        assert_eq!(spec.encode(), "ControlLeft");
        assert_eq!(spec.display_name(), "Left Control");
    }

    #[test]
    fn test_escape_cancels_from_awaiting_modifier() {
        let (session, effects) = run(&[CaptureInput::Activate, CaptureInput::KeyDown("Escape")]);
        assert_eq!(session, CaptureSession::Idle);
        assert_eq!(committed(&effects), None);
        assert!(effects.contains(&Effect::Cancel));
        assert!(effects.contains(&Effect::ResumeListener));
    }

    #[test]
    fn test_escape_cancels_from_awaiting_combo() {
        let (session, effects) = run(&[
            CaptureInput::Activate,
            CaptureInput::KeyDown("MetaRight"),
            CaptureInput::KeyDown("Escape"),
        ]);
        assert_eq!(session, CaptureSession::Idle);
        assert_eq!(committed(&effects), None);
        assert_eq!(
            &effects[effects.len() - 4..],
            &[
                Effect::ConsumeKey,
                Effect::Cancel,
                Effect::ResumeListener,
                Effect::ShowCurrent
            ]
        );
    }

    #[test]
    fn test_unrecognized_key_is_consumed_without_transition() {
        let t = CaptureSession::AwaitingModifier.step(CaptureInput::KeyDown("ArrowUp"));
        assert_eq!(t.session, CaptureSession::AwaitingModifier);
        assert_eq!(t.effects, vec![Effect::ConsumeKey]);

        let held = CaptureSession::AwaitingCombo {
            modifier: ModifierKey::ShiftLeft,
        };
        for code in ["F1", "ArrowDown", "Minus", "ShiftRight", "left_option"] {
            let t = held.step(CaptureInput::KeyDown(code));
            assert_eq!(t.session, held);
            assert_eq!(t.effects, vec![Effect::ConsumeKey]);
        }
    }

    #[test]
    fn test_ignored_key_then_combo() {
        let (session, effects) = run(&[
            CaptureInput::Activate,
            CaptureInput::KeyDown("ArrowUp"),
            CaptureInput::KeyDown("AltLeft"),
            CaptureInput::KeyDown("KeyZ"),
        ]);
        assert_eq!(session, CaptureSession::Idle);
        assert_eq!(committed(&effects).unwrap().encode(), "AltLeft+KeyZ");
    }

    #[test]
    fn test_regular_key_before_modifier_is_ignored() {
        let t = CaptureSession::AwaitingModifier.step(CaptureInput::KeyDown("KeyA"));
        assert_eq!(t.session, CaptureSession::AwaitingModifier);
        assert_eq!(t.effects, vec![Effect::ConsumeKey]);
    }

    #[test]
    fn test_release_of_other_key_does_not_commit() {
        let held = CaptureSession::AwaitingCombo {
            modifier: ModifierKey::AltRight,
        };
        let t = held.step(CaptureInput::KeyUp("AltLeft"));
        assert_eq!(t.session, held);
        assert!(t.effects.is_empty());

        let t = CaptureSession::AwaitingModifier.step(CaptureInput::KeyUp("AltLeft"));
        assert_eq!(t.session, CaptureSession::AwaitingModifier);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn test_keys_ignored_while_idle() {
        for input in [
            CaptureInput::KeyDown("AltLeft"),
            CaptureInput::KeyDown("Escape"),
            CaptureInput::KeyUp("AltLeft"),
        ] {
            let t = CaptureSession::Idle.step(input);
            assert_eq!(t.session, CaptureSession::Idle);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn test_activate_while_recording_cancels() {
        let held = CaptureSession::AwaitingCombo {
            modifier: ModifierKey::ControlRight,
        };
        let t = held.step(CaptureInput::Activate);
        assert_eq!(t.session, CaptureSession::Idle);
        assert_eq!(
            t.effects,
            vec![Effect::Cancel, Effect::ResumeListener, Effect::ShowCurrent]
        );
    }

    #[test]
    fn test_commit_precedes_label_refresh() {
        let held = CaptureSession::AwaitingCombo {
            modifier: ModifierKey::AltLeft,
        };
        let t = held.step(CaptureInput::KeyDown("Space"));
        let commit = t.effects.iter().position(|e| matches!(e, Effect::Commit(_)));
        let show = t.effects.iter().position(|e| *e == Effect::ShowCurrent);
        assert!(commit < show);
    }

    #[test]
    fn test_captured_modifier_only_in_combo_phase() {
        let held = CaptureSession::AwaitingModifier.step(CaptureInput::KeyDown("ShiftRight"));
        assert_eq!(held.session.phase(), CapturePhase::AwaitingCombo);
        assert_eq!(held.session.captured_modifier(), Some(ModifierKey::ShiftRight));
        assert_eq!(CaptureSession::AwaitingModifier.captured_modifier(), None);
    }
}
