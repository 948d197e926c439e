// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request per connection over the Unix socket.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pf_core::PluginId;
use pf_daemon::{Config, LifecycleError};
use pf_wire::{ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

pub use crate::client_queries::Submitted;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running (start it with `pf daemon start`)")]
    DaemonNotRunning,

    #[error("{0}")]
    Config(#[from] LifecycleError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The daemon answered with an error message
    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response from daemon: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    /// Client for the daemon of the current state directory.
    pub fn connect() -> Result<Self, ClientError> {
        Ok(Self::at(Config::load()?.socket_path))
    }

    pub fn at(socket_path: impl Into<PathBuf>) -> Self {
        Self { socket_path: socket_path.into(), timeout: pf_daemon::env::ipc_timeout() }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn open(&self) -> Result<UnixStream, ClientError> {
        match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => Ok(stream),
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                ) =>
            {
                Err(ClientError::DaemonNotRunning)
            }
            Err(e) => Err(ProtocolError::Io(e).into()),
        }
    }

    /// Send one request and read its response.
    pub(crate) async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let mut stream = self.open().await?;
        pf_wire::write_request(&mut stream, request, self.timeout).await?;
        Ok(pf_wire::read_response(&mut stream, self.timeout).await?)
    }

    /// Turn a response the caller did not expect into an error.
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            other => Err(ClientError::Unexpected(format!("{:?}", other))),
        }
    }

    /// Subscribe to the live build lines of a plugin.
    pub async fn follow(&self, plugin_id: &PluginId) -> Result<Follower, ClientError> {
        let mut stream = self.open().await?;
        let request = Request::Follow { plugin_id: plugin_id.clone() };
        pf_wire::write_request(&mut stream, &request, self.timeout).await?;
        match pf_wire::read_response(&mut stream, self.timeout).await? {
            Response::Ok => Ok(Follower { stream }),
            other => Self::reject(other),
        }
    }
}

/// A live tail opened by [`DaemonClient::follow`].
pub struct Follower {
    stream: UnixStream,
}

/// One streamed build line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowLine {
    pub text: String,
    pub error: bool,
}

impl Follower {
    /// Next line, or `None` once the daemon closes the stream.
    ///
    /// Waits without a timeout: builds can be quiet for minutes.
    pub async fn next_line(&mut self) -> Result<Option<FollowLine>, ClientError> {
        let bytes = match pf_wire::read_message(&mut self.stream).await {
            Ok(bytes) => bytes,
            Err(ProtocolError::ConnectionClosed) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match pf_wire::decode(&bytes)? {
            Response::Line { text, error } => Ok(Some(FollowLine { text, error })),
            other => DaemonClient::reject(other),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
