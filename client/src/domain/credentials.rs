//! Session credentials and the login/registration inputs that obtain them.
//!
//! Token values are wrapped in [`Zeroizing`] so they are wiped on drop, and
//! their `Debug` output is redacted so they never reach logs.

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

const REDACTED: &str = "<redacted>";

macro_rules! secret_token {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(Zeroizing<String>);

        impl $name {
            /// Wrap a raw token value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(Zeroizing::new(value.into()))
            }

            /// Raw token value, for building headers and request bodies only.
            pub fn expose(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&REDACTED).finish()
            }
        }
    };
}

secret_token! {
    /// Short-lived bearer credential attached to authenticated requests.
    AccessToken
}

secret_token! {
    /// Longer-lived credential exchanged for a fresh access token.
    RefreshToken
}

/// The credential pair held for the current session.
///
/// The pair is always replaced as a whole. The refresh token may be absent
/// when a host only handed the client an access token; a rejected access
/// token then ends the session instead of triggering a refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPair {
    access: AccessToken,
    refresh: Option<RefreshToken>,
}

impl CredentialPair {
    /// Pair holding both tokens.
    pub fn new(access: AccessToken, refresh: RefreshToken) -> Self {
        Self {
            access,
            refresh: Some(refresh),
        }
    }

    /// Pair holding only an access token.
    pub fn access_only(access: AccessToken) -> Self {
        Self {
            access,
            refresh: None,
        }
    }

    /// Bearer credential for outgoing requests.
    pub fn access(&self) -> &AccessToken {
        &self.access
    }

    /// Refresh credential, if one is held.
    pub fn refresh(&self) -> Option<&RefreshToken> {
        self.refresh.as_ref()
    }

    /// New pair after a refresh: the new access token plus the rotated
    /// refresh token when the server issued one, otherwise the current one.
    pub fn rotated(&self, access: AccessToken, refresh: Option<RefreshToken>) -> Self {
        Self {
            access,
            refresh: refresh.or_else(|| self.refresh.clone()),
        }
    }
}

/// Validation failures for login and registration inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialValidationError {
    /// Email was missing or blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Display name was missing or blank once trimmed.
    #[error("name must not be empty")]
    EmptyName,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `email` is trimmed and non-empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ada@example.test ", "hunter2")
///     .expect("valid credentials");
/// assert_eq!(creds.email(), "ada@example.test");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(CredentialValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self {
            email: email.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Account email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Account password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated registration details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: String,
    credentials: LoginCredentials,
}

impl Registration {
    /// Construct registration details from raw inputs.
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CredentialValidationError::EmptyName);
        }
        let credentials = LoginCredentials::try_from_parts(email, password)?;
        Ok(Self {
            name: name.to_owned(),
            credentials,
        })
    }

    /// Display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Credentials used to log in once registered.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }
}
