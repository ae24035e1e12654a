//! Client configuration loaded via OrthoConfig.
//!
//! Values come from `CATALOGUE_*` environment variables or a configuration
//! file; command-line flags of the `catalogue` binary override them.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::outbound::{http::DEFAULT_REQUEST_TIMEOUT, session::DEFAULT_SESSION_FILE};

const DEFAULT_WINDOW_SIZE: u32 = pagination::DEFAULT_WINDOW_SIZE;

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Configuration sources could not be read or merged.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Loader failure description.
        message: String,
    },
    /// No API base URL was configured.
    #[error("missing API URL; set CATALOGUE_API_URL or pass --api-url")]
    MissingApiUrl,
    /// The API base URL is not an absolute URL.
    #[error("invalid API URL '{value}': {message}")]
    InvalidApiUrl {
        /// Configured value.
        value: String,
        /// Parser failure description.
        message: String,
    },
    /// The request timeout is zero.
    #[error("timeout must be at least one second")]
    ZeroTimeout,
    /// The session file path is not valid UTF-8.
    #[error("session file path '{path}' is not valid UTF-8")]
    NonUtf8SessionFile {
        /// Lossy rendering of the configured path.
        path: String,
    },
}

/// Runtime settings for the catalogue client.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CATALOGUE")]
pub struct ClientSettings {
    /// Base URL of the catalogue API.
    pub api_url: Option<String>,
    /// Per-request deadline in seconds.
    #[ortho_config(default = 15)]
    pub timeout_seconds: u64,
    /// Number of page buttons shown by list commands.
    #[ortho_config(default = 5)]
    pub window_size: u32,
    /// Items per page, when the API's page size is known up front.
    pub page_size: Option<u32>,
    /// Where the session is persisted between invocations.
    pub session_file: Option<PathBuf>,
    /// Serialise concurrent token refreshes.
    #[ortho_config(default = false)]
    pub coalesce_refresh: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_seconds: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            window_size: DEFAULT_WINDOW_SIZE,
            page_size: None,
            session_file: None,
            coalesce_refresh: false,
        }
    }
}

impl ClientSettings {
    /// Load settings from the environment and configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("catalogue")]).map_err(|err| ConfigError::Load {
            message: err.to_string(),
        })
    }

    /// Parsed API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiUrl`] when unset and
    /// [`ConfigError::InvalidApiUrl`] when not an absolute URL.
    pub fn api_url(&self) -> Result<Url, ConfigError> {
        let value = self
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ConfigError::MissingApiUrl)?;
        Url::parse(value).map_err(|err| ConfigError::InvalidApiUrl {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// Per-request deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroTimeout`] when configured as zero.
    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        match self.timeout_seconds {
            0 => Err(ConfigError::ZeroTimeout),
            seconds => Ok(Duration::from_secs(seconds)),
        }
    }

    /// Session file path, defaulting to [`DEFAULT_SESSION_FILE`] in the
    /// working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NonUtf8SessionFile`] when the configured path is
    /// not valid UTF-8.
    pub fn session_file(&self) -> Result<Utf8PathBuf, ConfigError> {
        match &self.session_file {
            None => Ok(Utf8PathBuf::from(DEFAULT_SESSION_FILE)),
            Some(path) => Utf8PathBuf::from_path_buf(path.clone()).map_err(|path| {
                ConfigError::NonUtf8SessionFile {
                    path: path.to_string_lossy().into_owned(),
                }
            }),
        }
    }
}
