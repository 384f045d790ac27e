//! Resilient request subsystem.
//!
//! This module groups endpoint discovery, load-balanced dispatch with
//! bounded failover, and cached bearer-token authentication.

mod auth;
mod balancer;
mod discovery;
mod endpoint;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthToken, AuthTokenCache, Credentials, DEFAULT_REFRESH_BUFFER};
pub use balancer::{LoadBalancedClient, RequestTemplate, DEFAULT_MAX_RETRIES, DEFAULT_REQUEST_TIMEOUT};
pub use discovery::{parse_registry_response, EndpointResolver};
pub use endpoint::{DiscoveryMode, Endpoint, EndpointSet, HttpMethod, URL_PLACEHOLDER};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

#[cfg(test)]
pub(crate) use auth::jwt_expiring_at;
