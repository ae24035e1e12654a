//! Driven port for dispatching HTTP requests to the remote API.
//!
//! The domain resolves URLs and headers; adapters own the wire details
//! (connection pooling, timeouts, multipart encoding).

use async_trait::async_trait;
use url::Url;

use super::define_port_error;
use crate::domain::{HttpMethod, RequestBody};

/// Fully resolved request handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Absolute target URL.
    pub url: Url,
    /// Header name/value pairs, in the order they should be applied.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<RequestBody>,
}

impl TransportRequest {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response returned by the transport, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes; empty when the server sent none.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Failures raised before a response was received.
    pub enum TransportError {
        /// The request exceeded the configured deadline.
        Timeout { message: String } =>
            "request timed out: {message}",
        /// The server could not be reached or dropped the connection.
        NoResponse { message: String } =>
            "no response from server: {message}",
        /// The request could not be built or failed in an unexpected way.
        Unexpected { message: String } =>
            "transport failed: {message}",
    }
}

impl TransportError {
    /// Whether the failure means no response reached the client.
    pub fn is_no_response(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::NoResponse { .. })
    }
}

/// Port for sending one HTTP request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Dispatch `request` and return the response, including non-2xx ones.
    ///
    /// Only failures that prevent a response from arriving are errors.
    async fn dispatch(&self, request: TransportRequest)
    -> Result<TransportResponse, TransportError>;
}
