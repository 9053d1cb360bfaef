//! Unix domain socket server for IPC
//!
//! UI processes forward the capture control's clicks and key events here
//! and receive back whether each key must be swallowed. Subscribed clients
//! also get capture events pushed on the same connection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::capture::CaptureController;
use crate::events::CaptureEvent;
use crate::hotkey::display_name_for;

use super::protocol::{CaptureStatus, Request, Response, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    shared: Arc<Shared>,
    shutdown_tx: broadcast::Sender<()>,
}

/// State shared by all client handlers
struct Shared {
    controller: Mutex<CaptureController>,
    start_time: Instant,
    /// Source of notifications for subscribed clients
    event_tx: broadcast::Sender<CaptureEvent>,
}

impl Shared {
    async fn status(&self) -> CaptureStatus {
        let controller = self.controller.lock().await;
        status_of(&controller, self.start_time)
    }
}

fn status_of(controller: &CaptureController, start_time: Instant) -> CaptureStatus {
    CaptureStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        capturing: controller.is_capturing(),
        phase: controller.phase(),
        ptt_key: controller.ptt_key().to_owned(),
        display_name: controller.display_name(),
        label: controller.label().clone(),
        uptime_secs: start_time.elapsed().as_secs(),
    }
}

impl Server {
    /// Bind the IPC socket
    pub fn new(
        socket_path: &Path,
        controller: CaptureController,
        event_tx: broadcast::Sender<CaptureEvent>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Owner-only access
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set socket permissions")?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let shared = Arc::new(Shared {
            controller: Mutex::new(controller),
            start_time: Instant::now(),
            event_tx,
        });

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            shared,
            shutdown_tx,
        })
    }

    /// Snapshot of the capture control
    pub async fn status(&self) -> CaptureStatus {
        self.shared.status().await
    }

    /// Abandon any capture in progress so the global listener is resumed
    pub async fn cancel_capture(&self) -> bool {
        self.shared.controller.lock().await.cancel()
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let shared = Arc::clone(&self.shared);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, shared) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(stream: UnixStream, shared: Arc<Shared>) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();
        let (out_tx, mut out_rx) = mpsc::channel::<Response>(32);

        // Responses and notifications share one writer so frames never interleave
        let writer_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                if let Err(e) = write_frame(&mut writer, &msg).await {
                    debug!(?e, "client write failed");
                    break;
                }
            }
        });

        let mut forwarder = None;
        let result = Self::serve_requests(&mut reader, &out_tx, &shared, &mut forwarder).await;

        if let Some(task) = forwarder {
            task.abort();
        }
        drop(out_tx);
        let _ = writer_task.await;

        result
    }

    async fn serve_requests(
        reader: &mut OwnedReadHalf,
        out_tx: &mpsc::Sender<Response>,
        shared: &Arc<Shared>,
        forwarder: &mut Option<JoinHandle<()>>,
    ) -> Result<()> {
        loop {
            let Some(bytes) = read_frame(reader).await? else {
                debug!("client disconnected");
                return Ok(());
            };

            let response = match serde_json::from_slice::<Request>(&bytes) {
                Ok(request) => {
                    debug!(?request, "received request");
                    let (response, subscribe) = Self::process_request(request, shared).await;
                    if subscribe && forwarder.is_none() {
                        debug!("client subscribed to notifications");
                        *forwarder = Some(Self::forward_events(
                            shared.event_tx.subscribe(),
                            out_tx.clone(),
                        ));
                    }
                    response
                }
                Err(e) => {
                    warn!(error = %e, "unparseable request");
                    Response::error("bad_request", e.to_string())
                }
            };

            if out_tx.send(response).await.is_err() {
                return Ok(());
            }
        }
    }

    /// Push capture events to one subscribed client
    fn forward_events(
        mut event_rx: broadcast::Receiver<CaptureEvent>,
        out_tx: mpsc::Sender<Response>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        if out_tx.send(Response::Notification { event }).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(request: Request, shared: &Shared) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => (Response::Status(shared.status().await), false),

            Request::StartCapture => {
                let mut controller = shared.controller.lock().await;
                if controller.start_capture() {
                    (Response::Status(status_of(&controller, shared.start_time)), false)
                } else {
                    (
                        Response::error("already_capturing", "a capture is already in progress"),
                        false,
                    )
                }
            }

            Request::ToggleCapture => {
                let mut controller = shared.controller.lock().await;
                controller.toggle();
                (Response::Status(status_of(&controller, shared.start_time)), false)
            }

            Request::KeyDown { code } => {
                let disposition = shared.controller.lock().await.handle_key_down(&code);
                (Response::Key { disposition }, false)
            }

            Request::KeyUp { code } => {
                let disposition = shared.controller.lock().await.handle_key_up(&code);
                (Response::Key { disposition }, false)
            }

            Request::DisplayName { code } => (
                Response::DisplayName {
                    name: display_name_for(&code),
                },
                false,
            ),

            Request::SetPttKey { ptt_key } => {
                let mut controller = shared.controller.lock().await;
                controller.set_ptt_key(ptt_key);
                (Response::Status(status_of(&controller, shared.start_time)), false)
            }

            Request::Subscribe => (Response::Subscribed, true),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Read one length-prefixed message body; `None` on clean disconnect or an
/// oversized frame
async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;
    Ok(Some(msg_buf))
}

/// Send a length-prefixed JSON message
async fn write_frame<W: AsyncWrite + Unpin, T: serde::Serialize>(
    writer: &mut W,
    msg: &T,
) -> Result<()> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = u32::try_from(msg_bytes.len())
        .context("message too large")?
        .to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;
    writer.flush().await?;

    Ok(())
}
