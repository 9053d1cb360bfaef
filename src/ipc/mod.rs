//! IPC module for daemon-UI communication

mod protocol;
mod server;

pub use protocol::{CaptureStatus, Request, Response, MAX_MESSAGE_LEN};
pub use server::Server;
