//! Outbound adapters implementing the client's ports.
//!
//! - **http**: reqwest-backed [`HttpTransport`](crate::domain::ports::HttpTransport)
//! - **session**: in-memory and file-backed
//!   [`SessionStore`](crate::domain::ports::SessionStore)s
//!
//! Adapters translate between domain types and their infrastructure; they
//! hold no request or session policy.

pub mod http;
pub mod session;
