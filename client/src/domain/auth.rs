//! Login, registration and logout against the catalogue API.
//!
//! Authentication calls are sent anonymously so a stale access token never
//! rides along with (or triggers a refresh for) a fresh login.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{
    AccessToken, ApiClient, ApiRequest, ClientError, CredentialPair, LoginCredentials,
    RefreshToken, Registration,
};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/api/login/";
/// Registration endpoint.
pub const REGISTER_PATH: &str = "/api/register/";

/// User record returned by the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisteredUser {
    /// Server-assigned identifier, when returned.
    #[serde(default)]
    pub id: Option<u64>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Account email.
    #[serde(default)]
    pub email: String,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Credentials now held by the session.
    pub credentials: CredentialPair,
    /// Account details echoed by the server.
    pub user: RegisteredUser,
}

#[derive(Debug, Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenPairDto {
    access: String,
    refresh: String,
}

#[derive(Debug, Deserialize)]
struct RegisterResponseDto {
    #[serde(flatten)]
    user: RegisteredUser,
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

impl TokenPairDto {
    fn into_credentials(self) -> Result<CredentialPair, ClientError> {
        if self.access.is_empty() || self.refresh.is_empty() {
            return Err(ClientError::unexpected(
                "authentication response did not include both tokens",
            ));
        }
        Ok(CredentialPair::new(
            AccessToken::new(self.access),
            RefreshToken::new(self.refresh),
        ))
    }
}

/// Authentication use-cases bound to one client and its session.
#[derive(Clone)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    /// Wrap `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Log in and hold the returned credential pair.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the API rejects the credentials or the
    /// response does not carry both tokens.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<CredentialPair, ClientError> {
        let request = ApiRequest::post(LOGIN_PATH)
            .with_json(&LoginBody {
                email: credentials.email(),
                password: credentials.password(),
            })?
            .anonymous();
        let pair = self
            .client
            .request::<TokenPairDto>(&request)
            .await?
            .into_credentials()?;
        self.client.store_credentials(&pair)?;
        info!("login succeeded");
        Ok(pair)
    }

    /// Register an account and hold its credentials.
    ///
    /// When the registration response carries no token pair, a login with the
    /// same credentials obtains one.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when registration or the follow-up login
    /// fails.
    pub async fn register(
        &self,
        registration: &Registration,
    ) -> Result<RegistrationOutcome, ClientError> {
        let credentials = registration.credentials();
        let request = ApiRequest::post(REGISTER_PATH)
            .with_json(&RegisterBody {
                name: registration.name(),
                email: credentials.email(),
                password: credentials.password(),
            })?
            .anonymous();
        let response = self.client.request::<RegisterResponseDto>(&request).await?;

        let issued = response
            .access
            .filter(|token| !token.is_empty())
            .zip(response.refresh.filter(|token| !token.is_empty()));
        let pair = match issued {
            Some((access, refresh)) => {
                let pair = CredentialPair::new(AccessToken::new(access), RefreshToken::new(refresh));
                self.client.store_credentials(&pair)?;
                info!("registration succeeded");
                pair
            }
            None => {
                info!("registration returned no tokens, logging in");
                self.login(credentials).await?
            }
        };

        Ok(RegistrationOutcome {
            credentials: pair,
            user: response.user,
        })
    }

    /// Drop the held credentials.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the session store fails.
    pub fn logout(&self) -> Result<(), ClientError> {
        self.client.clear_credentials()?;
        info!("logged out");
        Ok(())
    }

    /// Access token currently held, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the session store fails.
    pub fn access_token(&self) -> Result<Option<AccessToken>, ClientError> {
        Ok(self
            .client
            .credentials()?
            .map(|pair| pair.access().clone()))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"access": "a", "refresh": ""}"#)]
    #[case(r#"{"access": "", "refresh": "r"}"#)]
    fn token_pairs_require_both_tokens(#[case] body: &str) {
        let dto: TokenPairDto = serde_json::from_str(body).expect("dto decodes");
        assert!(dto.into_credentials().is_err());
    }

    #[rstest]
    fn registration_responses_split_user_and_tokens() {
        let dto: RegisterResponseDto = serde_json::from_str(
            r#"{"id": 7, "name": "Ada", "email": "ada@example.test", "access": "a", "refresh": "r"}"#,
        )
        .expect("dto decodes");
        assert_eq!(
            dto.user,
            RegisteredUser {
                id: Some(7),
                name: "Ada".to_owned(),
                email: "ada@example.test".to_owned(),
            }
        );
        assert_eq!(dto.access.as_deref(), Some("a"));
        assert_eq!(dto.refresh.as_deref(), Some("r"));
    }

    #[rstest]
    fn registration_responses_without_tokens_decode() {
        let dto: RegisterResponseDto =
            serde_json::from_str(r#"{"name": "Ada", "email": "ada@example.test"}"#)
                .expect("dto decodes");
        assert_eq!(dto.user.id, None);
        assert!(dto.access.is_none());
    }
}
