//! Settings/backend service client

mod client;

pub use client::BackendClient;
