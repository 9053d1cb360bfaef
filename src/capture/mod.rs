//! Push-to-talk trigger capture
//!
//! `session` is the recording state machine as a pure reducer;
//! `controller` owns a session for one capture control and carries out
//! what each transition asks for.

mod controller;
mod session;

pub use controller::{CaptureController, CaptureLabel, KeyDisposition};
pub use session::{CaptureInput, CapturePhase, CaptureSession, Effect, Prompt, Transition};
