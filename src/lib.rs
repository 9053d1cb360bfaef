//! Push-to-talk trigger capture
//!
//! Records a modifier or modifier+key trigger from UI key events, keeps the
//! backend's global hotkey listener out of the way while doing so, and
//! encodes the result in the stored `ptt_key` format.

/// Client for the settings/backend service
pub mod backend;
/// Capture state machine and controller
pub mod capture;
/// Daemon configuration
pub mod config;
/// Capture events
pub mod events;
/// Key naming and trigger encoding
pub mod hotkey;
/// UI-facing socket protocol and server
pub mod ipc;
/// Process lifecycle
pub mod lifecycle;
/// Global listener pause/resume
pub mod listener;
/// Settings document
pub mod settings;
