use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the on-disk JSON store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store file {path} is not a valid record map: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read store file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write store file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A datagram payload that is not a well-formed message.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("payload is not a message object: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind datagram listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to receive datagram: {0}")]
    Receive(#[source] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("store task failed: {0}")]
    StoreTask(#[from] tokio::task::JoinError),
}

/// The producer could not hand a datagram to the transport.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to open producer socket: {0}")]
    Socket(#[source] io::Error),
    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to send datagram to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to bind HTTP server on {addr}: {source}")]
    HttpBind {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("HTTP server terminated: {0}")]
    HttpServe(#[source] io::Error),
}
