//! Client for the settings/backend service that owns the global listener
//!
//! Messages use the same framing as the daemon's own socket: a 4-byte
//! little-endian length followed by a JSON body.

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ipc::MAX_MESSAGE_LEN;
use crate::listener::{ListenerControl, ListenerError};

/// Commands sent to the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendRequest {
    /// Suspend global hotkey matching
    PauseHotkeyListener,
    /// Resume global hotkey matching
    ResumeHotkeyListener,
}

impl BackendRequest {
    fn name(&self) -> &'static str {
        match self {
            BackendRequest::PauseHotkeyListener => "pause_hotkey_listener",
            BackendRequest::ResumeHotkeyListener => "resume_hotkey_listener",
        }
    }
}

/// Replies from the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendResponse {
    /// Command applied
    Ok,
    /// Command refused
    Error { code: String, message: String },
}

/// Transport-level failures talking to the backend
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid backend message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("backend message too large: {0} bytes")]
    TooLarge(usize),
}

/// Blocking client; one connection per command
#[derive(Debug, Clone)]
pub struct BackendClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl BackendClient {
    /// Create a client for the backend listening at `socket_path`
    pub fn new(socket_path: &Path, timeout: Duration) -> Self {
        Self {
            socket_path: socket_path.to_owned(),
            timeout,
        }
    }

    /// Send one request and wait for its response
    ///
    /// Reads and writes are bounded by the timeout. The connect is not: a
    /// missing socket fails at once and a live one accepts into its backlog.
    pub fn call(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let mut stream = UnixStream::connect(&self.socket_path)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        write_message(&mut stream, request)?;
        let response = read_message(&mut stream)?;

        debug!(command = request.name(), ?response, "backend replied");
        Ok(response)
    }

    fn command(&self, request: BackendRequest) -> Result<(), ListenerError> {
        match self.call(&request) {
            Ok(BackendResponse::Ok) => Ok(()),
            Ok(BackendResponse::Error { code, message }) => Err(ListenerError::Rejected {
                command: request.name().to_owned(),
                message: format!("{}: {}", code, message),
            }),
            Err(e) => Err(ListenerError::Unreachable(e.to_string())),
        }
    }
}

impl ListenerControl for BackendClient {
    fn pause(&self) -> Result<(), ListenerError> {
        self.command(BackendRequest::PauseHotkeyListener)
    }

    fn resume(&self) -> Result<(), ListenerError> {
        self.command(BackendRequest::ResumeHotkeyListener)
    }
}

/// Write a length-prefixed JSON message
pub fn write_message<W: Write, T: Serialize>(
    writer: &mut W,
    msg: &T,
) -> Result<(), BackendError> {
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = u32::try_from(msg_bytes.len())
        .map_err(|_| BackendError::TooLarge(msg_bytes.len()))?;

    writer.write_all(&msg_len.to_le_bytes())?;
    writer.write_all(&msg_bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a length-prefixed JSON message
pub fn read_message<R: Read, T: serde::de::DeserializeOwned>(
    reader: &mut R,
) -> Result<T, BackendError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(BackendError::TooLarge(len));
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf)?;
    Ok(serde_json::from_slice(&msg_buf)?)
}
