//! Shared helpers for client integration tests.
//!
//! Integration tests compile as separate crates, so the scripted transport
//! and recording observer live here instead of being copied into each file.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use client::domain::{
    AccessToken, ApiClient, CredentialPair, RefreshToken,
    ports::{
        HttpTransport, SessionInvalidation, SessionObserver, TransportError, TransportRequest,
        TransportResponse,
    },
};
use client::outbound::session::InMemorySessionStore;
use serde_json::Value;

pub const BASE_URL: &str = "https://api.example.test";

type Handler =
    Box<dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// Transport answering every request with a caller-supplied handler and
/// recording what it was asked to send.
///
/// Each dispatch yields once before answering so concurrent callers
/// interleave on a single-threaded runtime.
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        handler: impl Fn(&TransportRequest) -> Result<TransportResponse, TransportError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().expect("request log poisoned").clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| request.url.path().to_owned())
            .collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.paths().iter().filter(|seen| *seen == path).count()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn dispatch(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        self.requests
            .lock()
            .expect("request log poisoned")
            .push(request.clone());
        tokio::task::yield_now().await;
        (self.handler)(&request)
    }
}

/// Observer remembering every invalidation it was told about.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<SessionInvalidation>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<SessionInvalidation> {
        self.events.lock().expect("event log poisoned").clone()
    }
}

impl SessionObserver for RecordingObserver {
    fn session_invalidated(&self, reason: SessionInvalidation) {
        self.events
            .lock()
            .expect("event log poisoned")
            .push(reason);
    }
}

/// Client wired to the scripted transport, an in-memory session and a
/// recording observer.
pub struct Harness {
    pub client: ApiClient,
    pub transport: Arc<ScriptedTransport>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub fn new(transport: Arc<ScriptedTransport>, session: InMemorySessionStore) -> Self {
        let observer = Arc::new(RecordingObserver::default());
        let client = ApiClient::new(
            BASE_URL,
            transport.clone(),
            Arc::new(session),
            observer.clone(),
        )
        .expect("client builds");
        Self {
            client,
            transport,
            observer,
        }
    }

    pub fn held(&self) -> Option<CredentialPair> {
        self.client.credentials().expect("session readable")
    }
}

pub fn pair(access: &str, refresh: &str) -> CredentialPair {
    CredentialPair::new(AccessToken::new(access), RefreshToken::new(refresh))
}

pub fn reply(status: u16, body: &Value) -> Result<TransportResponse, TransportError> {
    Ok(TransportResponse {
        status,
        body: serde_json::to_vec(body).expect("encode body"),
    })
}

pub fn token_not_valid() -> Result<TransportResponse, TransportError> {
    reply(
        401,
        &serde_json::json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid",
        }),
    )
}

pub fn bearer(request: &TransportRequest) -> Option<&str> {
    request
        .header("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
}

pub fn json_body(request: &TransportRequest) -> Option<&Value> {
    match request.body.as_ref()? {
        client::domain::RequestBody::Json(value) => Some(value),
        client::domain::RequestBody::Multipart(_) => None,
    }
}
