//! Fire-and-forget pause/resume of the global hotkey listener
//!
//! While a capture control is recording, the backend's global listener must
//! not react to the keys being recorded. Calls go to a dedicated worker
//! thread so a slow or dead backend never delays key handling, and they
//! reach the backend in the order they were issued.

use std::sync::mpsc;
use std::thread;

use tracing::{debug, error, info, warn};

/// Errors from the backend while pausing or resuming its listener
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),

    #[error("backend rejected {command}: {message}")]
    Rejected { command: String, message: String },

    #[error("failed to spawn coordinator thread: {0}")]
    ThreadSpawn(String),
}

/// Control over the externally owned global hotkey listener
#[cfg_attr(test, mockall::automock)]
pub trait ListenerControl: Send {
    /// Suspend global hotkey matching
    fn pause(&self) -> Result<(), ListenerError>;

    /// Resume global hotkey matching with the configured trigger
    fn resume(&self) -> Result<(), ListenerError>;
}

/// Requests queued for the worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenerCommand {
    Pause,
    Resume,
}

/// Forwards pause/resume requests to a [`ListenerControl`] without waiting
pub struct ListenerCoordinator {
    command_tx: Option<mpsc::Sender<ListenerCommand>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl ListenerCoordinator {
    /// Start the worker thread that owns `control`
    pub fn spawn(control: Box<dyn ListenerControl>) -> Result<Self, ListenerError> {
        let (command_tx, command_rx) = mpsc::channel::<ListenerCommand>();

        let worker = thread::Builder::new()
            .name("listener-coordinator".to_string())
            .spawn(move || {
                debug!("listener coordinator started");
                for command in command_rx {
                    let result = match command {
                        ListenerCommand::Pause => control.pause(),
                        ListenerCommand::Resume => control.resume(),
                    };
                    match result {
                        Ok(()) => debug!(?command, "global listener updated"),
                        Err(e) => warn!(?command, error = %e, "global listener call failed"),
                    }
                }
                debug!("listener coordinator stopped");
            })
            .map_err(|e| ListenerError::ThreadSpawn(e.to_string()))?;

        info!("listener coordinator ready");

        Ok(Self {
            command_tx: Some(command_tx),
            worker: Some(worker),
        })
    }

    /// Ask the backend to suspend its global listener
    pub fn pause(&self) {
        self.send(ListenerCommand::Pause);
    }

    /// Ask the backend to resume its global listener
    pub fn resume(&self) {
        self.send(ListenerCommand::Resume);
    }

    /// Drain queued requests and stop the worker
    ///
    /// Returns `false` if the worker thread panicked.
    pub fn shutdown(mut self) -> bool {
        self.stop()
    }

    fn stop(&mut self) -> bool {
        // Closing the channel lets the worker drain what is queued and exit
        self.command_tx.take();
        match self.worker.take() {
            Some(worker) => worker.join().is_ok(),
            None => true,
        }
    }

    fn send(&self, command: ListenerCommand) {
        let Some(tx) = &self.command_tx else {
            return;
        };
        if tx.send(command).is_err() {
            warn!(?command, "listener coordinator is gone, request dropped");
        }
    }
}

impl Drop for ListenerCoordinator {
    fn drop(&mut self) {
        if !self.stop() {
            error!("listener coordinator thread panicked");
        }
    }
}
