//! ptt-capture-daemon: records the push-to-talk trigger for a dictation app
//!
//! UI processes (the settings panel, the onboarding wizard) forward clicks
//! on their capture control and their key events here. The daemon:
//! - Runs the capture state machine (modifier, then optional combo key)
//! - Pauses the backend's global hotkey listener while recording
//! - Persists the committed trigger as `ptt_key` in the settings document
//! - Pushes capture events to subscribed UIs
//!
//! Audio, transcription and the global listener itself live elsewhere.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use ptt_capture::backend::BackendClient;
use ptt_capture::capture::CaptureController;
use ptt_capture::config::Config;
use ptt_capture::events::CaptureEvent;
use ptt_capture::hotkey;
use ptt_capture::ipc::Server;
use ptt_capture::lifecycle::ShutdownSignal;
use ptt_capture::listener::ListenerCoordinator;
use ptt_capture::settings::{persist_commits, FileSettingsStore, Settings, SettingsStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "ptt-capture-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, ?config.backend_socket, "configuration loaded");

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Current trigger
    let file_store = FileSettingsStore::new(&config.settings_path);
    debug!(path = ?file_store.path(), "settings store");
    let store: Arc<dyn SettingsStore> = Arc::new(file_store);
    let settings = store.load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load settings, using defaults");
        Settings::default()
    });
    if hotkey::is_legacy(&settings.ptt_key) {
        debug!(ptt_key = %settings.ptt_key, "stored trigger uses a legacy name");
    }
    info!(
        ptt_key = %settings.ptt_key,
        display_name = %settings.ptt_display_name(),
        resolved = %settings.ptt_key_target(),
        "push-to-talk trigger loaded"
    );

    // Capture controller -> IPC subscribers and persistence
    let (event_tx, _event_rx) = broadcast::channel::<CaptureEvent>(64);

    // Pause/resume of the backend's global listener
    let backend = BackendClient::new(&config.backend_socket, config.backend_timeout);
    let listener = Arc::new(
        ListenerCoordinator::spawn(Box::new(backend))
            .context("failed to start listener coordinator")?,
    );

    let controller =
        CaptureController::new(settings.ptt_key, Arc::clone(&listener), event_tx.clone());

    let server = Server::new(&config.socket_path, controller, event_tx.clone())?;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Persist committed triggers
        _ = persist_commits(event_tx.subscribe(), Arc::clone(&store)) => {
            info!("capture event handler exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    let status = server.status().await;
    info!(ptt_key = %status.ptt_key, capturing = status.capturing, "shutting down...");

    // Leave the global listener running behind us
    if server.cancel_capture().await {
        info!("abandoned capture in progress");
    }

    server.shutdown().await;
    drop(server);

    // The server owned the controller; the coordinator should be ours alone now
    match Arc::try_unwrap(listener) {
        Ok(coordinator) => {
            if !coordinator.shutdown() {
                warn!("listener coordinator did not stop cleanly");
            }
        }
        Err(_) => debug!("listener coordinator still shared, leaving it to drop"),
    }

    info!("ptt-capture-daemon stopped");

    Ok(())
}

