//! Outbound request descriptors.
//!
//! A descriptor is plain data: method, path relative to the API base, extra
//! headers, and an owned body. Because nothing in it is consumed by sending,
//! the client can replay the same descriptor after refreshing credentials.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::ClientError;

/// HTTP verbs used by the catalogue API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File upload field.
    File {
        /// Field name.
        name: String,
        /// File name reported to the server.
        file_name: String,
        /// MIME type, when known.
        content_type: Option<String>,
        /// File contents.
        bytes: Vec<u8>,
    },
}

impl FormPart {
    /// Text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Field name, whatever the part kind.
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name.as_str(),
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// JSON document.
    Json(Value),
    /// Multipart form; the transport chooses the boundary.
    Multipart(Vec<FormPart>),
}

/// Which send of a descriptor is in flight.
///
/// A descriptor is sent at most twice: the initial attempt and, after a
/// successful refresh, a single replay. A replay is never refreshed again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// First send.
    Initial,
    /// Resend after the credentials were refreshed.
    Replay,
}

impl Attempt {
    /// Whether a rejected credential on this attempt may still be refreshed.
    pub const fn may_refresh(self) -> bool {
        matches!(self, Self::Initial)
    }
}

/// Immutable description of one API call.
///
/// # Examples
/// ```
/// use client::domain::{ApiRequest, HttpMethod};
///
/// let request = ApiRequest::post("/api/login/")
///     .with_json(&serde_json::json!({ "email": "ada@example.test" }))
///     .expect("serialisable body")
///     .anonymous();
/// assert_eq!(request.method(), HttpMethod::Post);
/// assert!(request.is_anonymous());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: HttpMethod,
    path: String,
    headers: Vec<(String, String)>,
    body: Option<RequestBody>,
    anonymous: bool,
}

impl ApiRequest {
    /// Descriptor for `method` against `path` (relative to the API base).
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: None,
            anonymous: false,
        }
    }

    /// `GET` descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// `POST` descriptor.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// `PUT` descriptor.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    /// `PATCH` descriptor.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    /// `DELETE` descriptor.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected` [`ClientError`] when `body` cannot be
    /// represented as JSON.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|err| {
            ClientError::unexpected(format!("request body is not serialisable: {err}"))
                .with_cause(err)
        })?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    /// Attach a multipart form body.
    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Add a request header. Later headers with the same name win.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Never attach the bearer credential, nor refresh on rejection.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// HTTP verb.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path relative to the API base, including any query string.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Caller-supplied headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        self.headers.as_slice()
    }

    /// Body, if any.
    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// Whether the bearer credential is withheld.
    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}
