//! Authenticated request client.
//!
//! [`ApiClient::send`] attaches the held access token, dispatches the request
//! and, when the API answers with its "token not valid" signal, exchanges the
//! refresh token for a new pair and replays the request once. A replay is
//! never refreshed again, so repeated rejections end after two dispatches.
//!
//! Every failure is normalised into a [`ClientError`]. When the session
//! cannot be recovered the held credentials are cleared and the
//! [`SessionObserver`] is told why.

use std::sync::Arc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{
    AccessToken, ApiRequest, Attempt, ClientError, CredentialPair, HttpMethod,
    NO_RESPONSE_MESSAGE, RefreshToken, RequestBody,
    error_message::{
        DEFAULT_EXTRACTORS, MessageExtractor, decode_payload, extract_message, is_token_invalid,
    },
    ports::{
        HttpTransport, SessionInvalidation, SessionObserver, SessionStore, SessionStoreError,
        TransportError, TransportRequest, TransportResponse,
    },
};

/// Endpoint exchanging a refresh token for a new access token.
pub const DEFAULT_REFRESH_PATH: &str = "/api/token/refresh/";

const ACCEPT: &str = "Accept";
const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";
const JSON_MEDIA_TYPE: &str = "application/json";
const MALFORMED_REFRESH_MESSAGE: &str = "Token refresh returned an unusable response.";
const MISSING_REFRESH_MESSAGE: &str = "No refresh token is held.";

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBody {
    status: u16,
    bytes: Vec<u8>,
}

impl ResponseBody {
    /// HTTP status of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Raw body bytes, unchanged.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Consume the body, returning the raw bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decode the body as JSON. An empty body decodes as `null`, so
    /// `()` and `Option<_>` targets accept `204 No Content`.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected` [`ClientError`] when the body does not match
    /// `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let decoded = if self.bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&self.bytes)
        };
        decoded.map_err(|err| {
            ClientError::unexpected(format!("response body could not be decoded: {err}"))
                .with_status(self.status)
                .with_cause(err)
        })
    }
}

impl From<TransportResponse> for ResponseBody {
    fn from(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            bytes: response.body,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

/// A response carrying the "token not valid" signal.
#[derive(Debug)]
struct Rejected {
    status: u16,
    payload: Option<Value>,
}

/// Outcome of the latest refresh run behind the gate.
///
/// Requests that find their session cleared by that refresh report its
/// failure instead of refreshing or notifying again.
#[derive(Debug, Default)]
struct RefreshOutcome {
    failure: Option<ClientError>,
}

enum Completion {
    Body(ResponseBody),
    Refresh(Rejected),
}

/// Client for the catalogue REST API.
///
/// Cloning is cheap; clones share the transport, session store, observer
/// and refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    session: Arc<dyn SessionStore>,
    observer: Arc<dyn SessionObserver>,
    refresh_path: String,
    refresh_gate: Option<Arc<Mutex<RefreshOutcome>>>,
    extractors: &'static [MessageExtractor],
}

impl ApiClient {
    /// Build a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected` [`ClientError`] when `base_url` is not an
    /// absolute URL.
    pub fn new(
        base_url: &str,
        transport: Arc<dyn HttpTransport>,
        session: Arc<dyn SessionStore>,
        observer: Arc<dyn SessionObserver>,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/');
        Url::parse(base_url).map_err(|err| {
            ClientError::unexpected(format!("invalid API base URL '{base_url}': {err}"))
                .with_cause(err)
        })?;
        Ok(Self {
            base_url: base_url.to_owned(),
            transport,
            session,
            observer,
            refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
            refresh_gate: None,
            extractors: &DEFAULT_EXTRACTORS,
        })
    }

    /// Use a different refresh endpoint.
    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Serialise refreshes across clones of this client.
    ///
    /// When enabled, a request whose rejected access token has already been
    /// replaced by a concurrent refresh replays with the new token instead of
    /// refreshing again. Disabled by default: each rejected request runs its
    /// own refresh.
    #[must_use]
    pub fn with_refresh_coalescing(mut self, enabled: bool) -> Self {
        self.refresh_gate = enabled.then(|| Arc::new(Mutex::new(RefreshOutcome::default())));
        self
    }

    /// Use a different message extractor list for rejected responses.
    #[must_use]
    pub fn with_message_extractors(mut self, extractors: &'static [MessageExtractor]) -> Self {
        self.extractors = extractors;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Currently held credential pair.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected` [`ClientError`] when the session store fails.
    pub fn credentials(&self) -> Result<Option<CredentialPair>, ClientError> {
        self.session.get().map_err(store_failure)
    }

    /// Replace the held credential pair.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected` [`ClientError`] when the session store fails.
    pub fn store_credentials(&self, credentials: &CredentialPair) -> Result<(), ClientError> {
        self.session.set(credentials).map_err(store_failure)
    }

    /// Drop the held credential pair.
    ///
    /// # Errors
    ///
    /// Returns an `Unexpected` [`ClientError`] when the session store fails.
    pub fn clear_credentials(&self) -> Result<(), ClientError> {
        self.session.clear().map_err(store_failure)
    }

    /// Send `request`, refreshing the session and replaying once if the
    /// access token was rejected.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] describing the first unrecoverable failure.
    pub async fn send(&self, request: &ApiRequest) -> Result<ResponseBody, ClientError> {
        let stale = if request.is_anonymous() {
            None
        } else {
            self.credentials()?
        };
        let stale_access = stale.as_ref().map(CredentialPair::access);

        let response = self
            .attempt(request, stale_access, Attempt::Initial)
            .await?;
        let rejected = match self.classify(request, response, Attempt::Initial)? {
            Completion::Body(body) => return Ok(body),
            Completion::Refresh(rejected) => rejected,
        };

        let access = self.recover(stale_access, rejected).await?;
        let replay = self
            .attempt(request, Some(&access), Attempt::Replay)
            .await?;
        match self.classify(request, replay, Attempt::Replay)? {
            Completion::Body(body) => Ok(body),
            Completion::Refresh(rejected) => Err(self.rejection(rejected.status, rejected.payload)),
        }
    }

    /// Send `request` and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when sending fails or the body does not
    /// decode as `T`.
    pub async fn request<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ClientError> {
        self.send(request).await?.json()
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(&ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(&ApiRequest::post(path).with_json(body)?).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(&ApiRequest::put(path).with_json(body)?).await
    }

    /// `PATCH path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(&ApiRequest::patch(path).with_json(body)?).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(&ApiRequest::delete(path)).await
    }

    /// Exchange the refresh token in `held` for a new credential pair.
    ///
    /// The result is [`CredentialPair::rotated`] from `held`: the new access
    /// token plus the rotated refresh token when the server issued one. The
    /// session store is left untouched.
    ///
    /// # Errors
    ///
    /// Every failure (no refresh token held, no response, rejection, unusable
    /// body) is a `SessionExpired` [`ClientError`].
    pub async fn refresh(&self, held: &CredentialPair) -> Result<CredentialPair, ClientError> {
        let refresh = held
            .refresh()
            .ok_or_else(|| ClientError::session_expired(MISSING_REFRESH_MESSAGE))?;
        let request = TransportRequest {
            method: HttpMethod::Post,
            url: self.resolve(&self.refresh_path)?,
            headers: vec![
                (ACCEPT.to_owned(), JSON_MEDIA_TYPE.to_owned()),
                (CONTENT_TYPE.to_owned(), JSON_MEDIA_TYPE.to_owned()),
            ],
            body: Some(RequestBody::Json(json!({ "refresh": refresh.expose() }))),
        };

        let response = self.transport.dispatch(request).await.map_err(|err| {
            let message = if err.is_no_response() {
                NO_RESPONSE_MESSAGE.to_owned()
            } else {
                err.to_string()
            };
            ClientError::session_expired(message).with_cause(err)
        })?;

        let payload = decode_payload(&response.body);
        if !response.is_success() {
            let message = extract_message(
                payload.as_ref(),
                Some(&status_message(response.status)),
                self.extractors,
            );
            return Err(ClientError::session_expired(message)
                .with_status(response.status)
                .with_data(payload));
        }

        let decoded = payload
            .and_then(|payload| serde_json::from_value::<RefreshResponse>(payload).ok())
            .filter(|decoded| !decoded.access.is_empty())
            .ok_or_else(|| {
                ClientError::session_expired(MALFORMED_REFRESH_MESSAGE)
                    .with_status(response.status)
            })?;

        let rotated = decoded
            .refresh
            .filter(|token| !token.is_empty())
            .map(RefreshToken::new);
        Ok(held.rotated(AccessToken::new(decoded.access), rotated))
    }

    async fn attempt(
        &self,
        request: &ApiRequest,
        access: Option<&AccessToken>,
        attempt: Attempt,
    ) -> Result<TransportResponse, ClientError> {
        let transport_request = self.transport_request(request, access)?;
        debug!(
            method = %request.method(),
            path = request.path(),
            attempt = ?attempt,
            authenticated = transport_request.header(AUTHORIZATION).is_some(),
            "dispatching API request"
        );
        self.transport
            .dispatch(transport_request)
            .await
            .map_err(|err| {
                debug!(error = %err, path = request.path(), "API request got no response");
                transport_failure(err)
            })
    }

    fn classify(
        &self,
        request: &ApiRequest,
        response: TransportResponse,
        attempt: Attempt,
    ) -> Result<Completion, ClientError> {
        if response.is_success() {
            return Ok(Completion::Body(response.into()));
        }

        let status = response.status;
        let payload = decode_payload(&response.body);
        if attempt.may_refresh()
            && !request.is_anonymous()
            && is_token_invalid(status, payload.as_ref())
        {
            return Ok(Completion::Refresh(Rejected { status, payload }));
        }

        debug!(status, path = request.path(), attempt = ?attempt, "API request rejected");
        Err(self.rejection(status, payload))
    }

    async fn recover(
        &self,
        stale_access: Option<&AccessToken>,
        rejected: Rejected,
    ) -> Result<AccessToken, ClientError> {
        let Some(gate) = &self.refresh_gate else {
            let current = self.credentials()?;
            return self.refresh_session(current, rejected).await;
        };

        let mut last = gate.lock().await;
        let current = self.credentials()?;
        if let Some(replaced) = current
            .as_ref()
            .map(CredentialPair::access)
            .filter(|access| Some(*access) != stale_access)
        {
            debug!("access token already refreshed, replaying");
            return Ok(replaced.clone());
        }
        if current.is_none() && stale_access.is_some() {
            debug!("session cleared while the request was in flight");
            return Err(last.failure.clone().unwrap_or_else(|| self.expired(rejected)));
        }
        let outcome = self.refresh_session(current, rejected).await;
        last.failure = outcome.as_ref().err().cloned();
        outcome
    }

    async fn refresh_session(
        &self,
        current: Option<CredentialPair>,
        rejected: Rejected,
    ) -> Result<AccessToken, ClientError> {
        let Some(held) = current.filter(|pair| pair.refresh().is_some()) else {
            warn!(status = rejected.status, "access token rejected and no refresh token is held");
            self.invalidate(SessionInvalidation::MissingRefreshToken);
            return Err(self.expired(rejected));
        };

        match self.refresh(&held).await {
            Ok(next) => {
                self.store_credentials(&next)?;
                info!("access token refreshed");
                Ok(next.access().clone())
            }
            Err(err) => {
                error!(error = %err, status = ?err.status(), "token refresh failed");
                self.invalidate(SessionInvalidation::RefreshFailed);
                Err(err)
            }
        }
    }

    fn expired(&self, rejected: Rejected) -> ClientError {
        let message = extract_message(
            rejected.payload.as_ref(),
            Some(&status_message(rejected.status)),
            self.extractors,
        );
        ClientError::session_expired(message)
            .with_status(rejected.status)
            .with_data(rejected.payload)
    }

    fn invalidate(&self, reason: SessionInvalidation) {
        if let Err(err) = self.session.clear() {
            warn!(error = %err, "failed to clear session credentials");
        }
        self.observer.session_invalidated(reason);
    }

    fn rejection(&self, status: u16, payload: Option<Value>) -> ClientError {
        let message = extract_message(
            payload.as_ref(),
            Some(&status_message(status)),
            self.extractors,
        );
        ClientError::response(status, message, payload)
    }

    fn transport_request(
        &self,
        request: &ApiRequest,
        access: Option<&AccessToken>,
    ) -> Result<TransportRequest, ClientError> {
        let mut headers = vec![(ACCEPT.to_owned(), JSON_MEDIA_TYPE.to_owned())];
        if matches!(request.body(), Some(RequestBody::Json(_))) {
            headers.push((CONTENT_TYPE.to_owned(), JSON_MEDIA_TYPE.to_owned()));
        }
        if let Some(access) = access.filter(|_| !request.is_anonymous()) {
            headers.push((AUTHORIZATION.to_owned(), format!("Bearer {}", access.expose())));
        }
        for (name, value) in request.headers() {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }

        Ok(TransportRequest {
            method: request.method(),
            url: self.resolve(request.path())?,
            headers,
            body: request.body().cloned(),
        })
    }

    fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        let target = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_owned()
        } else if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };
        Url::parse(&target).map_err(|err| {
            ClientError::unexpected(format!("invalid request URL '{target}': {err}"))
                .with_cause(err)
        })
    }
}

fn status_message(status: u16) -> String {
    format!("Request failed with status code {status}")
}

fn transport_failure(err: TransportError) -> ClientError {
    if err.is_no_response() {
        ClientError::no_response().with_cause(err)
    } else {
        ClientError::unexpected(err.to_string()).with_cause(err)
    }
}

fn store_failure(err: SessionStoreError) -> ClientError {
    ClientError::unexpected(err.to_string()).with_cause(err)
}
