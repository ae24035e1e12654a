//! JSON file session store.
//!
//! Keeps the credential pair across command invocations, the way a browser
//! keeps tokens in local storage. Writes go to a hidden temporary file in the
//! same directory and are renamed over the target, so a crash never leaves a
//! half-written session behind.

use std::io::{self, Write};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{
    ambient_authority,
    fs::{Dir, OpenOptions},
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::{
    AccessToken, CredentialPair, RefreshToken,
    ports::{SessionStore, SessionStoreError},
};

/// File name used when no session file is configured.
pub const DEFAULT_SESSION_FILE: &str = ".catalogue-session.json";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// On-disk shape of the session. Token buffers are wiped when dropped.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    access: Zeroizing<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<Zeroizing<String>>,
}

impl StoredSession {
    fn from_pair(pair: &CredentialPair) -> Self {
        Self {
            access: Zeroizing::new(pair.access().expose().to_owned()),
            refresh: pair
                .refresh()
                .map(|token| Zeroizing::new(token.expose().to_owned())),
        }
    }

    fn into_pair(self) -> Result<CredentialPair, SessionStoreError> {
        if self.access.is_empty() {
            return Err(SessionStoreError::corrupt("stored access token is empty"));
        }
        let access = AccessToken::new(self.access.as_str());
        Ok(match self.refresh.as_deref().filter(|token| !token.is_empty()) {
            Some(refresh) => CredentialPair::new(access, RefreshToken::new(refresh.as_str())),
            None => CredentialPair::access_only(access),
        })
    }
}

/// Session store persisting the credential pair as a JSON file.
#[derive(Debug)]
pub struct FileSessionStore {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    /// Store backed by the file at `path`. The parent directory must exist;
    /// the file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`SessionStoreError::Read`] when `path` names no file or its
    /// directory cannot be opened.
    pub fn open(path: &Utf8Path) -> Result<Self, SessionStoreError> {
        let file_name = path
            .file_name()
            .ok_or_else(|| SessionStoreError::read(format!("session path '{path}' names no file")))?
            .to_owned();
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| {
            SessionStoreError::read(format!("cannot open session directory '{parent}': {err}"))
        })?;
        Ok(Self {
            dir,
            file_name,
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the session file.
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    fn write_atomic(&self, contents: &str) -> Result<(), SessionStoreError> {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_nanos());
        let tmp_name = format!(
            ".{}.tmp.{}.{}.{}",
            self.file_name,
            std::process::id(),
            suffix,
            counter
        );

        if let Err(err) = self.write_temp(&tmp_name, contents) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(self.write_error(&err));
        }
        if let Err(err) = self.replace_target(&tmp_name) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(self.write_error(&err));
        }
        Ok(())
    }

    fn write_temp(&self, tmp_name: &str, contents: &str) -> io::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        let mut file = self.dir.open_with(tmp_name, &options)?;
        restrict_to_owner(&self.dir, tmp_name)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    }

    #[cfg(windows)]
    fn replace_target(&self, tmp_name: &str) -> io::Result<()> {
        // Windows rename fails if the target exists.
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        self.dir.rename(tmp_name, &self.dir, &self.file_name)
    }

    #[cfg(not(windows))]
    fn replace_target(&self, tmp_name: &str) -> io::Result<()> {
        self.dir.rename(tmp_name, &self.dir, &self.file_name)
    }

    fn write_error(&self, err: &io::Error) -> SessionStoreError {
        SessionStoreError::write(format!("{}: {err}", self.path))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, SessionStoreError> {
        self.write_lock
            .lock()
            .map_err(|_| SessionStoreError::write("session file lock poisoned"))
    }
}

#[cfg(unix)]
fn restrict_to_owner(dir: &Dir, name: &str) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = std::fs::Permissions::from_mode(0o600);
    dir.set_permissions(name, cap_std::fs::Permissions::from_std(permissions))
}

#[cfg(not(unix))]
fn restrict_to_owner(_dir: &Dir, _name: &str) -> io::Result<()> {
    Ok(())
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<CredentialPair>, SessionStoreError> {
        let contents = match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => Zeroizing::new(contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(SessionStoreError::read(format!("{}: {err}", self.path)));
            }
        };
        let stored: StoredSession = serde_json::from_str(&contents)
            .map_err(|err| SessionStoreError::corrupt(format!("{}: {err}", self.path)))?;
        stored.into_pair().map(Some)
    }

    fn set(&self, credentials: &CredentialPair) -> Result<(), SessionStoreError> {
        let contents = serde_json::to_string_pretty(&StoredSession::from_pair(credentials))
            .map(Zeroizing::new)
            .map_err(|err| SessionStoreError::write(format!("cannot encode session: {err}")))?;
        let _guard = self.lock()?;
        self.write_atomic(&contents)
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        let _guard = self.lock()?;
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.write_error(&err)),
        }
    }
}
