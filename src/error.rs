//! Error types for the streaming client.

use thiserror::Error;

/// Failure of the transport carrying a turn. Never recoverable within the turn.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("cannot reach chat endpoint '{url}': {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("chat endpoint '{url}' returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("response stream broke: {source}")]
    Body {
        #[source]
        source: reqwest::Error,
    },

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why `submit` refused to start a turn.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    #[error("message is empty")]
    Empty,

    #[error("a turn is already in progress")]
    Busy,
}
