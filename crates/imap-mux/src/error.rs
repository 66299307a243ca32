//! Error types for the engine.
//!
//! The variants fall into a few families: transport failures (fatal for the
//! session), protocol violations (also fatal; the stream cannot be
//! resynchronized past malformed data), IMAP-level command failures
//! (surfaced to the caller, session continues), and invalid caller input
//! (rejected before anything reaches the wire).

use std::io;

use thiserror::Error;

use crate::types::Status;

/// Errors that can occur while driving an IMAP session.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Malformed response data.
    #[error("parse error at position {position}: {message}")]
    Parse {
        /// Byte offset into the response unit where parsing failed.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// Protocol violation outside the parser, such as a tagged completion
    /// with no matching pending command or an oversize frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A tagged completion with `NO` or `BAD` status, converted to an error
    /// by [`StatusResponse::into_result`](crate::StatusResponse::into_result).
    #[error("imap: {status} {text}")]
    Imap {
        /// The completion status.
        status: Status,
        /// Human-readable text from the server.
        text: String,
    },

    /// The caller withdrew interest in an in-flight command. The stream
    /// cannot be safely resynchronized afterwards, so this tears the
    /// session down.
    #[error("command abandoned by caller")]
    Cancelled,

    /// The session is torn down; pending and future commands fail with this.
    #[error("session closed: {0}")]
    Closed(String),

    /// The server greeting was not an untagged OK.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Invalid caller-supplied input. Nothing was written to the wire.
    #[error("invalid input: {0}")]
    Config(String),
}

impl Error {
    /// Returns true if this error ends the session.
    ///
    /// `Imap` and `Config` errors leave the session usable; everything else
    /// means the connection is (or is about to be) gone.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Imap { .. } | Self::Config(_))
    }
}

/// Result type alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
