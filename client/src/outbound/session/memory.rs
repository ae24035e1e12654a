//! Process-local session store.

use std::sync::RwLock;

use crate::domain::{
    CredentialPair,
    ports::{SessionStore, SessionStoreError},
};

/// Session store holding the credential pair in memory.
///
/// Writes swap the whole pair under a write lock, so readers see either the
/// previous pair or the new one.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    credentials: RwLock<Option<CredentialPair>>,
}

impl InMemorySessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already holding `credentials`.
    pub fn with_credentials(credentials: CredentialPair) -> Self {
        Self {
            credentials: RwLock::new(Some(credentials)),
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self) -> Result<Option<CredentialPair>, SessionStoreError> {
        self.credentials
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SessionStoreError::read("session lock poisoned"))
    }

    fn set(&self, credentials: &CredentialPair) -> Result<(), SessionStoreError> {
        let mut guard = self
            .credentials
            .write()
            .map_err(|_| SessionStoreError::write("session lock poisoned"))?;
        *guard = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let mut guard = self
            .credentials
            .write()
            .map_err(|_| SessionStoreError::write("session lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{AccessToken, RefreshToken};
    use rstest::rstest;

    fn pair(access: &str) -> CredentialPair {
        CredentialPair::new(AccessToken::new(access), RefreshToken::new("r1"))
    }

    #[rstest]
    fn stores_start_empty() {
        assert_eq!(InMemorySessionStore::new().get().expect("read"), None);
    }

    #[rstest]
    fn set_replaces_and_clear_removes() {
        let store = InMemorySessionStore::with_credentials(pair("a1"));
        store.set(&pair("a2")).expect("write");
        assert_eq!(store.get().expect("read"), Some(pair("a2")));

        store.clear().expect("clear");
        assert_eq!(store.get().expect("read"), None);
        store.clear().expect("clearing twice succeeds");
    }

    #[rstest]
    fn independent_stores_do_not_share_sessions() {
        let first = InMemorySessionStore::with_credentials(pair("a1"));
        let second = InMemorySessionStore::new();
        assert!(first.get().expect("read").is_some());
        assert!(second.get().expect("read").is_none());
    }
}
