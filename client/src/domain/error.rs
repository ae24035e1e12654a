//! Normalised client error.
//!
//! Every failure path of the request client (no response, rejected request,
//! failed refresh, anything unforeseen) converges on [`ClientError`] before it
//! reaches a caller. Callers display [`ClientError::message`] verbatim.

use std::{error::Error as StdError, sync::Arc};

use serde_json::Value;
use thiserror::Error;

/// Message used when the server never answered.
pub const NO_RESPONSE_MESSAGE: &str = "No response received from server.";
/// Message used when a rejected response carries nothing usable.
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed.";
/// Message used when an unexpected failure carries no message of its own.
pub const UNEXPECTED_MESSAGE: &str = "Unexpected error.";

type Cause = Arc<dyn StdError + Send + Sync>;

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientErrorKind {
    /// No response reached the client (timeout, connection failure).
    Transport,
    /// The credentials were rejected and could not be refreshed; the session
    /// has been cleared.
    SessionExpired,
    /// The server answered with a non-2xx status.
    Response,
    /// Anything else: bad input, undecodable success bodies, storage faults.
    Unexpected,
}

/// Error returned by every client operation.
///
/// # Examples
/// ```
/// use client::domain::{ClientError, ClientErrorKind};
///
/// let err = ClientError::response(404, "Not found.", None);
/// assert_eq!(err.kind(), ClientErrorKind::Response);
/// assert_eq!(err.status(), Some(404));
/// assert_eq!(err.to_string(), "Not found.");
/// ```
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    kind: ClientErrorKind,
    message: String,
    status: Option<u16>,
    data: Option<Value>,
    #[source]
    cause: Option<Cause>,
}

impl ClientError {
    fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            data: None,
            cause: None,
        }
    }

    /// No response reached the client.
    pub fn no_response() -> Self {
        Self::new(ClientErrorKind::Transport, NO_RESPONSE_MESSAGE)
    }

    /// The session could not be recovered.
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::SessionExpired, message)
    }

    /// The server rejected the request with `status`.
    pub fn response(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            status: Some(status),
            data,
            ..Self::new(ClientErrorKind::Response, message)
        }
    }

    /// Unexpected failure. A blank message falls back to
    /// [`UNEXPECTED_MESSAGE`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::new(ClientErrorKind::Unexpected, UNEXPECTED_MESSAGE)
        } else {
            Self::new(ClientErrorKind::Unexpected, message)
        }
    }

    /// Attach the underlying failure.
    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// Attach the HTTP status of the response that caused this error.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach the decoded response payload.
    pub fn with_data(mut self, data: Option<Value>) -> Self {
        self.data = data;
        self
    }

    /// Failure category.
    pub fn kind(&self) -> ClientErrorKind {
        self.kind
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Decoded response payload, when the body was JSON.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    /// Whether the session was torn down by this failure.
    pub fn is_session_expired(&self) -> bool {
        self.kind == ClientErrorKind::SessionExpired
    }
}
