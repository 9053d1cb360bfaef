//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureLabel, CapturePhase, KeyDisposition};
use crate::events::CaptureEvent;

/// Largest message body accepted, in bytes
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from a UI (settings panel, onboarding) to the daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current capture status
    GetStatus,

    /// Begin recording a trigger; refused while one is in progress
    StartCapture,

    /// The capture control was clicked: start, or abandon a running capture
    ToggleCapture,

    /// A key went down in the UI
    KeyDown { code: String },

    /// A key went up in the UI
    KeyUp { code: String },

    /// Label for a stored trigger value
    DisplayName { code: String },

    /// The UI loaded settings holding this trigger; show it when idle
    SetPttKey { ptt_key: String },

    /// Ping to check connectivity
    Ping,

    /// Subscribe to capture event notifications
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current capture status
    Status(CaptureStatus),

    /// Whether the UI must stop the key event from going anywhere else
    Key { disposition: KeyDisposition },

    /// Label for the requested trigger value
    DisplayName { name: String },

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Pushed to subscribed clients
    Notification { event: CaptureEvent },

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    /// Error response with a machine-readable code
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_owned(),
            message: message.into(),
        }
    }
}

/// Snapshot of the capture control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureStatus {
    /// Daemon version
    pub version: String,

    /// Whether a recording is in progress
    pub capturing: bool,

    /// Recording phase
    pub phase: CapturePhase,

    /// Committed trigger, exactly as stored
    pub ptt_key: String,

    /// Label for the committed trigger
    pub display_name: String,

    /// What the control currently shows
    pub label: CaptureLabel,

    /// Uptime in seconds
    pub uptime_secs: u64,
}
