//! Events emitted by capture controls
//!
//! Subscribed IPC clients receive these as push notifications; the daemon
//! itself listens for `Committed` to persist the new trigger.

use serde::{Deserialize, Serialize};

/// Events emitted while recording a push-to-talk trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CaptureEvent {
    /// Recording began; the global listener has been asked to pause
    CaptureStarted,

    /// A modifier was pressed and is waiting for a combo key or release
    ModifierCaptured {
        /// Raw identifier of the held modifier
        modifier: String,
    },

    /// A new trigger was recorded
    Committed {
        /// Encoded trigger value to persist
        ptt_key: String,
        /// Label for the new trigger
        display_name: String,
    },

    /// Recording ended without a new trigger
    Cancelled {
        /// The trigger value still in effect
        ptt_key: String,
    },
}

impl std::fmt::Display for CaptureEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureEvent::CaptureStarted => write!(f, "CAPTURE_STARTED"),
            CaptureEvent::ModifierCaptured { modifier } => {
                write!(f, "MODIFIER_CAPTURED ({})", modifier)
            }
            CaptureEvent::Committed { ptt_key, .. } => write!(f, "COMMITTED ({})", ptt_key),
            CaptureEvent::Cancelled { ptt_key } => write!(f, "CANCELLED ({})", ptt_key),
        }
    }
}
