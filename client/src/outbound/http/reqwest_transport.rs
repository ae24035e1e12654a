//! Reqwest-backed HTTP transport.
//!
//! This adapter owns wire details only: method and header translation, JSON
//! and multipart encoding, the request deadline, and mapping reqwest failures
//! onto [`TransportError`]. Status handling belongs to the request client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Method, RequestBuilder,
    multipart::{Form, Part},
};

use crate::domain::{
    FormPart, HttpMethod, RequestBody,
    ports::{HttpTransport, TransportError, TransportRequest, TransportResponse},
};

/// Deadline applied to each dispatch unless configured otherwise.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Transport sending requests through a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport with the default 15 second deadline.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a transport whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    #[cfg(test)]
    fn direct(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .expect("test client builds");
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn dispatch(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(map_method(method), url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = attach_body(builder, body)?;
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn map_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn attach_body(builder: RequestBuilder, body: RequestBody) -> Result<RequestBuilder, TransportError> {
    match body {
        RequestBody::Json(value) => {
            let bytes = serde_json::to_vec(&value).map_err(|err| {
                TransportError::unexpected(format!("JSON body could not be encoded: {err}"))
            })?;
            Ok(builder.body(bytes))
        }
        RequestBody::Multipart(parts) => Ok(builder.multipart(build_form(parts)?)),
    }
}

fn build_form(parts: Vec<FormPart>) -> Result<Form, TransportError> {
    parts.into_iter().try_fold(Form::new(), |form, part| match part {
        FormPart::Text { name, value } => Ok(form.text(name, value)),
        FormPart::File {
            name,
            file_name,
            content_type,
            bytes,
        } => {
            let file = Part::bytes(bytes).file_name(file_name);
            let file = match content_type {
                Some(content_type) => file.mime_str(&content_type).map_err(|err| {
                    TransportError::unexpected(format!(
                        "invalid content type '{content_type}' for field '{name}': {err}"
                    ))
                })?,
                None => file,
            };
            Ok(form.part(name, file))
        }
    })
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else if error.is_connect() || error.is_request() || error.is_body() {
        TransportError::no_response(error.to_string())
    } else {
        TransportError::unexpected(error.to_string())
    }
}
