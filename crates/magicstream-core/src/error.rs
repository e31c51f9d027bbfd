//! Error types for the Magic Stream client.
//!
//! Every request issued through the authenticated pipeline settles with
//! exactly one of: a [`Response`](crate::Response), [`Error::Transport`],
//! [`Error::SessionExpired`] or [`Error::Teardown`]. The remaining variants
//! are produced by the session lifecycle calls and by typed helpers that
//! interpret a response body.

use std::fmt;
use thiserror::Error;

/// The unified error type for Magic Stream client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, unreadable body).
    #[error("network error: {0}")]
    Transport(#[from] TransportError),

    /// The session could not be renewed, or a renewed session was still
    /// rejected by the server.
    #[error("session expired")]
    SessionExpired,

    /// The client was shut down while the request was still pending.
    #[error("client is shutting down")]
    Teardown,

    /// Login and session installation errors.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Unexpected status or body from the API.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (bad base URL, bad path).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this error means the caller must log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::SessionExpired)
    }

    /// Returns true if this error came from the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The response body could not be read.
    #[error("failed to read response body: {message}")]
    Body { message: String },
}

/// Authentication-related errors raised by the session lifecycle calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The server rejected the email/password pair.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A session renewal is in flight; login must wait for it to settle.
    #[error("a session renewal is in progress")]
    RefreshInProgress,

    /// A session already exists; log out first.
    #[error("already authenticated as {user_id}")]
    AlreadyAuthenticated { user_id: String },
}

/// Protocol-level errors from API responses.
#[derive(Debug)]
pub struct ProtocolError {
    /// HTTP status code.
    pub status: u16,
    /// Error string reported by the API (if present).
    pub error: Option<String>,
    /// Additional detail, e.g. a decode failure.
    pub message: Option<String>,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status)?;
        if let Some(ref error) = self.error {
            write!(f, " [{}]", error)?;
        }
        if let Some(ref message) = self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: u16, error: Option<String>, message: Option<String>) -> Self {
        Self {
            status,
            error,
            message,
        }
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        self.status == 401
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid base URL '{value}': {reason}")]
    BaseUrl { value: String, reason: String },

    /// Invalid request path.
    #[error("invalid path '{value}': {reason}")]
    Path { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
