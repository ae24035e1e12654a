//! Client domain: request descriptors, credentials, error normalisation and
//! the use-cases built on the authenticated request client.
//!
//! Public surface:
//! - [`ApiClient`] sends [`ApiRequest`]s with transparent token refresh.
//! - [`AuthService`] and [`CatalogueService`] wrap the API's endpoints.
//! - [`ClientError`] is the single error shape returned to callers.
//! - [`ports`] declares the transport, session store and observer seams.

pub mod api_client;
pub mod auth;
pub mod catalogue;
pub mod credentials;
pub mod error;
pub mod error_message;
pub mod ports;
pub mod request;

pub use self::api_client::{ApiClient, DEFAULT_REFRESH_PATH, ResponseBody};
pub use self::auth::{AuthService, LOGIN_PATH, REGISTER_PATH, RegisteredUser, RegistrationOutcome};
pub use self::catalogue::{
    AnalyticsBucket, AnalyticsSummary, Author, AuthorChanges, Book, BookChanges,
    CatalogueService, ImageUpload, NewAuthor, NewBook,
};
pub use self::credentials::{
    AccessToken, CredentialPair, CredentialValidationError, LoginCredentials, RefreshToken,
    Registration,
};
pub use self::error::{
    ClientError, ClientErrorKind, NO_RESPONSE_MESSAGE, REQUEST_FAILED_MESSAGE, UNEXPECTED_MESSAGE,
};
pub use self::request::{ApiRequest, Attempt, FormPart, HttpMethod, RequestBody};
