//! Error types for DID:HPASS resolution operations.
//!
//! Every failed resolution surfaces exactly one [`ResolutionError`]. Failures
//! that belong to endpoint discovery or to authentication are grouped under
//! [`DiscoveryError`] and [`AuthError`] so callers can match on the group or
//! on the precise cause.

use thiserror::Error;

/// Errors raised while looking up the endpoints serving a DID network
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    /// The registry could not be reached or never answered with a 2xx status
    #[error("registry unreachable: {0}")]
    RegistryUnreachable(String),

    /// The registry answered, but the body is empty, not JSON, or lacks `payload.environments`
    #[error("invalid registry response: {0}")]
    RegistryResponseInvalid(String),

    /// No REST environment with both a method and URLs was listed
    #[error("no usable endpoint: {0}")]
    NoUsableEndpoint(String),
}

/// Errors raised while obtaining a bearer token
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// User or password is not configured
    #[error("login credentials are not configured")]
    CredentialsMissing,

    /// The login endpoint failed at transport level or returned a non-2xx status
    #[error("login endpoint unreachable: {0}")]
    LoginUnreachable(String),

    /// The login response is not JSON or has no `access_token`
    #[error("invalid login response: {0}")]
    LoginResponseInvalid(String),
}

/// Errors that can occur during DID:HPASS resolution operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// The identifier does not match the `did:hpass` pattern
    #[error("malformed identifier: {0}")]
    IdentifierMalformed(String),

    /// Endpoint discovery failed
    #[error("endpoint discovery failed: {0}")]
    EndpointDiscovery(#[from] DiscoveryError),

    /// Authentication failed
    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    /// Every attempt of a load-balanced request failed
    #[error("request failed after {attempts} attempts: {message}")]
    RetryExhausted {
        /// Number of attempts that were made
        attempts: usize,
        /// Status code of the last attempt, if it produced a response
        last_status: Option<u16>,
        /// Description of the last failure
        message: String,
    },

    /// The resource could not be fetched for a reason other than retry exhaustion
    #[error("resource fetch failed: {0}")]
    ResourceFetchFailure(String),

    /// The fetched payload cannot be turned into a DID document
    #[error("invalid DID document: {0}")]
    DocumentInvalid(String),

    /// An endpoint URL template is not a valid URL
    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The driver configuration is incomplete or inconsistent
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller cancelled the resolution
    #[error("resolution cancelled")]
    Cancelled,
}

/// Flat category of a [`ResolutionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    IdentifierMalformed,
    RegistryUnreachable,
    RegistryResponseInvalid,
    NoUsableEndpoint,
    CredentialsMissing,
    LoginUnreachable,
    LoginResponseInvalid,
    RetryExhausted,
    ResourceFetchFailure,
    DocumentInvalid,
    InvalidEndpoint,
    Configuration,
    Cancelled,
}

impl ResolutionError {
    /// Returns the category of this error without its details
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IdentifierMalformed(_) => ErrorKind::IdentifierMalformed,
            Self::EndpointDiscovery(DiscoveryError::RegistryUnreachable(_)) => {
                ErrorKind::RegistryUnreachable
            }
            Self::EndpointDiscovery(DiscoveryError::RegistryResponseInvalid(_)) => {
                ErrorKind::RegistryResponseInvalid
            }
            Self::EndpointDiscovery(DiscoveryError::NoUsableEndpoint(_)) => {
                ErrorKind::NoUsableEndpoint
            }
            Self::Authentication(AuthError::CredentialsMissing) => ErrorKind::CredentialsMissing,
            Self::Authentication(AuthError::LoginUnreachable(_)) => ErrorKind::LoginUnreachable,
            Self::Authentication(AuthError::LoginResponseInvalid(_)) => {
                ErrorKind::LoginResponseInvalid
            }
            Self::RetryExhausted { .. } => ErrorKind::RetryExhausted,
            Self::ResourceFetchFailure(_) => ErrorKind::ResourceFetchFailure,
            Self::DocumentInvalid(_) => ErrorKind::DocumentInvalid,
            Self::InvalidEndpoint { .. } => ErrorKind::InvalidEndpoint,
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
