//! A capture control: one recording session plus the trigger it edits
//!
//! The controller feeds keyboard input to its [`CaptureSession`] and applies
//! the resulting effects: label updates, listener pause/resume, and the
//! committed-value signal on the event channel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::events::CaptureEvent;
use crate::hotkey::display_name_for;
use crate::listener::ListenerCoordinator;

use super::session::{CaptureInput, CapturePhase, CaptureSession, Effect, Transition};

/// What the control shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureLabel {
    /// Label text
    pub text: String,
    /// Whether the recording style is applied
    pub recording: bool,
}

/// Whether a key event was taken by the capture control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyDisposition {
    /// Must not reach any other handler
    Consumed,
    /// Not ours; let it through
    Ignored,
}

/// Owns the capture session of one control
pub struct CaptureController {
    session: CaptureSession,
    /// Committed trigger, exactly as stored
    ptt_key: String,
    label: CaptureLabel,
    listener: Arc<ListenerCoordinator>,
    event_tx: broadcast::Sender<CaptureEvent>,
}

impl CaptureController {
    /// Create an idle control showing `ptt_key`
    pub fn new(
        ptt_key: String,
        listener: Arc<ListenerCoordinator>,
        event_tx: broadcast::Sender<CaptureEvent>,
    ) -> Self {
        let label = CaptureLabel {
            text: display_name_for(&ptt_key),
            recording: false,
        };
        Self {
            session: CaptureSession::Idle,
            ptt_key,
            label,
            listener,
            event_tx,
        }
    }

    /// Whether a recording is in progress
    pub fn is_capturing(&self) -> bool {
        self.session.is_recording()
    }

    /// Current phase
    pub fn phase(&self) -> CapturePhase {
        self.session.phase()
    }

    /// Committed trigger, exactly as stored
    pub fn ptt_key(&self) -> &str {
        &self.ptt_key
    }

    /// Label for the committed trigger
    pub fn display_name(&self) -> String {
        display_name_for(&self.ptt_key)
    }

    /// What the control currently shows
    pub fn label(&self) -> &CaptureLabel {
        &self.label
    }

    /// Start recording
    ///
    /// Returns `false` and changes nothing if a recording is already running.
    pub fn start_capture(&mut self) -> bool {
        if self.is_capturing() {
            debug!(phase = %self.phase(), "capture already in progress");
            return false;
        }
        self.feed(CaptureInput::Activate);
        true
    }

    /// Click on the control: start recording, or abandon the one running
    pub fn toggle(&mut self) {
        self.feed(CaptureInput::Activate);
    }

    /// Abandon a running recording, leaving the committed trigger as it was
    ///
    /// Returns `false` if nothing was being recorded.
    pub fn cancel(&mut self) -> bool {
        if !self.is_capturing() {
            return false;
        }
        self.feed(CaptureInput::Activate);
        true
    }

    /// A key went down anywhere while this control is listening
    pub fn handle_key_down(&mut self, code: &str) -> KeyDisposition {
        self.feed(CaptureInput::KeyDown(code))
    }

    /// A key went up anywhere while this control is listening
    pub fn handle_key_up(&mut self, code: &str) -> KeyDisposition {
        self.feed(CaptureInput::KeyUp(code))
    }

    /// Replace the committed trigger from outside, e.g. after settings reload
    ///
    /// Ignored while recording so an in-progress capture is not disturbed.
    pub fn set_ptt_key(&mut self, ptt_key: String) {
        if self.is_capturing() {
            debug!(%ptt_key, "ignoring external trigger change during capture");
            return;
        }
        self.ptt_key = ptt_key;
        self.show_current();
    }

    fn feed(&mut self, input: CaptureInput<'_>) -> KeyDisposition {
        let from = self.session.phase();
        let transition = self.session.step(input);
        let disposition = self.apply(transition);
        let to = self.session.phase();

        if from != to {
            info!(from = %from, to = %to, "capture transition");
        } else if let CaptureInput::KeyDown(code) = input {
            if self.is_capturing() {
                debug!(code, phase = %to, "key not accepted in this phase");
            }
        }

        disposition
    }

    fn apply(&mut self, transition: Transition) -> KeyDisposition {
        let Transition { session, effects } = transition;
        self.session = session;

        let mut disposition = KeyDisposition::Ignored;
        for effect in effects {
            match effect {
                Effect::ConsumeKey => disposition = KeyDisposition::Consumed,
                Effect::PauseListener => {
                    self.listener.pause();
                    self.emit(CaptureEvent::CaptureStarted);
                }
                Effect::ResumeListener => self.listener.resume(),
                Effect::ShowPrompt(prompt) => {
                    self.label = CaptureLabel {
                        text: prompt.text().to_owned(),
                        recording: true,
                    };
                }
                Effect::ShowCurrent => self.show_current(),
                Effect::ModifierCaptured(modifier) => {
                    self.emit(CaptureEvent::ModifierCaptured {
                        modifier: modifier.code().to_owned(),
                    });
                }
                Effect::Commit(spec) => {
                    self.ptt_key = spec.encode();
                    info!(
                        ptt_key = %self.ptt_key,
                        combo = spec.is_combo(),
                        "push-to-talk trigger recorded"
                    );
                    self.emit(CaptureEvent::Committed {
                        ptt_key: self.ptt_key.clone(),
                        display_name: spec.display_name(),
                    });
                }
                Effect::Cancel => {
                    info!(ptt_key = %self.ptt_key, "capture cancelled");
                    self.emit(CaptureEvent::Cancelled {
                        ptt_key: self.ptt_key.clone(),
                    });
                }
            }
        }

        disposition
    }

    fn show_current(&mut self) {
        self.label = CaptureLabel {
            text: display_name_for(&self.ptt_key),
            recording: false,
        };
    }

    fn emit(&self, event: CaptureEvent) {
        debug!(%event, "emitting capture event");
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::MockListenerControl;
    use mockall::Sequence;

    struct Harness {
        controller: CaptureController,
        listener: Arc<ListenerCoordinator>,
        events: broadcast::Receiver<CaptureEvent>,
    }

    impl Harness {
        fn new(ptt_key: &str, control: MockListenerControl) -> Self {
            let listener = Arc::new(ListenerCoordinator::spawn(Box::new(control)).unwrap());
            let (tx, events) = broadcast::channel(16);
            let controller = CaptureController::new(ptt_key.to_owned(), Arc::clone(&listener), tx);
            Self {
                controller,
                listener,
                events,
            }
        }

        fn drain(&mut self) -> Vec<CaptureEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }

        /// Stop the coordinator and check the mock's expectations
        fn finish(self) {
            let Harness {
                controller,
                listener,
                ..
            } = self;
            drop(controller);
            let coordinator = Arc::try_unwrap(listener).ok().unwrap();
            assert!(coordinator.shutdown());
        }
    }

    fn pause_then_resume() -> MockListenerControl {
        let mut control = MockListenerControl::new();
        let mut seq = Sequence::new();
        control
            .expect_pause()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        control
            .expect_resume()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        control
    }

    #[test]
    fn test_idle_label_shows_current_value() {
        let mut control = MockListenerControl::new();
        control.expect_pause().never();
        control.expect_resume().never();
        let h = Harness::new("left_option", control);

        assert!(!h.controller.is_capturing());
        assert_eq!(h.controller.label().text, "Left Option");
        assert!(!h.controller.label().recording);
        h.finish();
    }

    #[test]
    fn test_combo_capture() {
        let mut h = Harness::new("AltLeft", pause_then_resume());

        assert!(h.controller.start_capture());
        assert!(h.controller.is_capturing());
        assert!(h.controller.label().recording);
        assert_eq!(h.controller.label().text, "Hold a modifier key\u{2026}");

        assert_eq!(h.controller.handle_key_down("AltLeft"), KeyDisposition::Consumed);
        assert_eq!(h.controller.phase(), CapturePhase::AwaitingCombo);
        assert_eq!(
            h.controller.label().text,
            "Now press a key, or release to use the modifier alone"
        );

        assert_eq!(h.controller.handle_key_down("KeyD"), KeyDisposition::Consumed);
        assert!(!h.controller.is_capturing());
        assert_eq!(h.controller.ptt_key(), "AltLeft+KeyD");
        assert_eq!(h.controller.label().text, "Left Option + D");
        assert!(!h.controller.label().recording);

        assert_eq!(
            h.drain(),
            vec![
                CaptureEvent::CaptureStarted,
                CaptureEvent::ModifierCaptured {
                    modifier: "AltLeft".to_owned()
                },
                CaptureEvent::Committed {
                    ptt_key: "AltLeft+KeyD".to_owned(),
                    display_name: "Left Option + D".to_owned(),
                },
            ]
        );
        h.finish();
    }

    #[test]
    fn test_modifier_only_capture() {
        let mut h = Harness::new("AltLeft+KeyZ", pause_then_resume());

        h.controller.start_capture();
        h.controller.handle_key_down("ControlLeft");
        // The release is not a key-down, nothing else needs it stopped
        assert_eq!(h.controller.handle_key_up("ControlLeft"), KeyDisposition::Ignored);

        assert_eq!(h.controller.ptt_key(), "ControlLeft");
        assert_eq!(h.controller.display_name(), "Left Control");
        h.finish();
    }

    #[test]
    fn test_escape_keeps_previous_value() {
        let mut h = Harness::new("right_shift", pause_then_resume());

        h.controller.start_capture();
        assert_eq!(h.controller.handle_key_down("Escape"), KeyDisposition::Consumed);

        assert!(!h.controller.is_capturing());
        assert_eq!(h.controller.ptt_key(), "right_shift");
        assert_eq!(h.controller.label().text, "Right Shift");
        assert_eq!(
            h.drain(),
            vec![
                CaptureEvent::CaptureStarted,
                CaptureEvent::Cancelled {
                    ptt_key: "right_shift".to_owned()
                },
            ]
        );
        h.finish();
    }

    #[test]
    fn test_unrecognized_key_consumed_and_ignored() {
        let mut h = Harness::new("AltLeft", pause_then_resume());

        h.controller.start_capture();
        assert_eq!(h.controller.handle_key_down("ArrowUp"), KeyDisposition::Consumed);
        assert_eq!(h.controller.phase(), CapturePhase::AwaitingModifier);
        h.controller.handle_key_down("AltLeft");
        h.controller.handle_key_down("KeyZ");

        assert_eq!(h.controller.ptt_key(), "AltLeft+KeyZ");
        h.finish();
    }

    #[test]
    fn test_keys_pass_through_when_idle() {
        let mut control = MockListenerControl::new();
        control.expect_pause().never();
        control.expect_resume().never();
        let mut h = Harness::new("AltLeft", control);

        assert_eq!(h.controller.handle_key_down("KeyA"), KeyDisposition::Ignored);
        assert_eq!(h.controller.handle_key_down("Escape"), KeyDisposition::Ignored);
        assert!(h.drain().is_empty());
        h.finish();
    }

    #[test]
    fn test_start_capture_twice_is_refused() {
        let mut control = MockListenerControl::new();
        control.expect_pause().times(1).returning(|| Ok(()));
        control.expect_resume().never();
        let mut h = Harness::new("AltLeft", control);

        assert!(h.controller.start_capture());
        assert!(!h.controller.start_capture());
        assert_eq!(h.controller.phase(), CapturePhase::AwaitingModifier);
        h.finish();
    }

    #[test]
    fn test_toggle_cancels_running_capture() {
        let mut h = Harness::new("MetaLeft", pause_then_resume());

        h.controller.toggle();
        h.controller.handle_key_down("ShiftLeft");
        h.controller.toggle();

        assert!(!h.controller.is_capturing());
        assert_eq!(h.controller.ptt_key(), "MetaLeft");
        h.finish();
    }

    #[test]
    fn test_cancel_resumes_listener() {
        let mut h = Harness::new("AltLeft+KeyD", pause_then_resume());

        assert!(!h.controller.cancel());
        h.controller.start_capture();
        h.controller.handle_key_down("MetaRight");
        assert!(h.controller.cancel());
        assert!(!h.controller.cancel());

        assert_eq!(h.controller.phase(), CapturePhase::Idle);
        assert_eq!(h.controller.ptt_key(), "AltLeft+KeyD");
        assert_eq!(h.controller.label().text, "Left Option + D");
        assert_eq!(
            h.drain().last(),
            Some(&CaptureEvent::Cancelled {
                ptt_key: "AltLeft+KeyD".to_owned()
            })
        );
        h.finish();
    }

    #[test]
    fn test_listener_failure_does_not_block_capture() {
        let mut control = MockListenerControl::new();
        control.expect_pause().times(1).returning(|| {
            Err(crate::listener::ListenerError::Unreachable("refused".to_owned()))
        });
        control.expect_resume().times(1).returning(|| {
            Err(crate::listener::ListenerError::Unreachable("refused".to_owned()))
        });
        let mut h = Harness::new("AltLeft", control);

        h.controller.start_capture();
        h.controller.handle_key_down("AltRight");
        h.controller.handle_key_down("Digit4");

        assert_eq!(h.controller.ptt_key(), "AltRight+Digit4");
        h.finish();
    }

    #[test]
    fn test_set_ptt_key_while_idle_and_recording() {
        let mut control = MockListenerControl::new();
        control.expect_pause().times(1).returning(|| Ok(()));
        control.expect_resume().times(1).returning(|| Ok(()));
        let mut h = Harness::new("AltLeft", control);

        h.controller.set_ptt_key("left_command+Space".to_owned());
        assert_eq!(h.controller.label().text, "Left Command + Space");

        h.controller.start_capture();
        h.controller.set_ptt_key("ShiftLeft".to_owned());
        assert_eq!(h.controller.ptt_key(), "left_command+Space");
        h.controller.handle_key_down("Escape");
        assert_eq!(h.controller.label().text, "Left Command + Space");
        h.finish();
    }
}
