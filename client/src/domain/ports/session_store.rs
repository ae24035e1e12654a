//! Driven port owning the credential pair of the current session.
//!
//! Only the request client's refresh step and explicit login/logout write to
//! the store. Implementations must replace the pair as one unit so readers
//! never observe a new access token next to a stale refresh token.

use super::define_port_error;
use crate::domain::CredentialPair;

define_port_error! {
    /// Errors raised by session storage.
    pub enum SessionStoreError {
        /// Stored credentials could not be read.
        Read { message: String } =>
            "session read failed: {message}",
        /// Credentials could not be written or removed.
        Write { message: String } =>
            "session write failed: {message}",
        /// Stored credentials exist but cannot be decoded.
        Corrupt { message: String } =>
            "stored session is corrupt: {message}",
    }
}

/// Port for reading and replacing the held credential pair.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Current credential pair, if a session is held.
    fn get(&self) -> Result<Option<CredentialPair>, SessionStoreError>;

    /// Replace the held pair.
    fn set(&self, credentials: &CredentialPair) -> Result<(), SessionStoreError>;

    /// Drop the held pair. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), SessionStoreError>;
}
