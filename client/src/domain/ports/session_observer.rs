//! Driven port notified when a session is torn down.
//!
//! Hosts subscribe to decide what an unrecoverable session means for them
//! (prompting for a new login, redirecting a view, exiting a command).

use std::fmt;

/// Why the held session was invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInvalidation {
    /// The access token was rejected and no refresh token was held.
    MissingRefreshToken,
    /// The refresh endpoint rejected the refresh token or could not be reached.
    RefreshFailed,
}

impl fmt::Display for SessionInvalidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRefreshToken => f.write_str("missing refresh token"),
            Self::RefreshFailed => f.write_str("token refresh failed"),
        }
    }
}

/// Port receiving session invalidation events.
#[cfg_attr(test, mockall::automock)]
pub trait SessionObserver: Send + Sync {
    /// Called once the held credentials have been cleared.
    fn session_invalidated(&self, reason: SessionInvalidation);
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSessionObserver;

impl SessionObserver for NoopSessionObserver {
    fn session_invalidated(&self, _reason: SessionInvalidation) {}
}
