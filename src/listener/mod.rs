//! Coordination with the backend's global hotkey listener

mod coordinator;

#[cfg(test)]
pub use coordinator::MockListenerControl;
pub use coordinator::{ListenerControl, ListenerCoordinator, ListenerError};
