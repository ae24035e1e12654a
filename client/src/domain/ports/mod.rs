//! Ports at the edge of the client hexagon.
//!
//! The request client drives three ports: the HTTP transport that reaches the
//! remote API, the session store that owns the credential pair, and the
//! observer told when a session can no longer be recovered.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod session_observer;
mod session_store;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{HttpTransport, TransportError, TransportRequest, TransportResponse};
#[cfg(test)]
pub use session_observer::MockSessionObserver;
pub use session_observer::{NoopSessionObserver, SessionInvalidation, SessionObserver};
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{SessionStore, SessionStoreError};
