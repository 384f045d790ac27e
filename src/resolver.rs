//! Core DID resolution functionality.
//!
//! This module sequences a resolution: the identifier is validated, the
//! serving endpoints are discovered, a bearer token is attached when
//! authentication is enabled, and the record is fetched through the
//! load-balanced client before being turned into a DID Document.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::DriverConfig;
use crate::did::HpassDid;
use crate::document::build_document;
use crate::error::ResolutionError;
use crate::network::{
    AuthTokenCache, DiscoveryMode, EndpointResolver, HttpMethod, HttpTransport, LoadBalancedClient,
    RequestTemplate, ReqwestTransport,
};
use crate::types::{ResolutionMetadata, ResolutionResult};

/// Body of a successful fetch and how its endpoints were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPayload {
    pub body: String,
    pub discovery_mode: DiscoveryMode,
}

/// Core resolver for DID:HPASS resolution
///
/// A `Resolver` is meant to be shared (e.g. in an `Arc`) by concurrent
/// resolutions; the cached bearer token is the only state they share.
#[derive(Debug)]
pub struct Resolver {
    endpoints: EndpointResolver,
    auth: Option<AuthTokenCache>,
    client: LoadBalancedClient,
}

impl Resolver {
    /// Creates a resolver talking HTTP through `reqwest`
    pub fn new(config: DriverConfig) -> Result<Self, ResolutionError> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.request_timeout())
            .map_err(|e| ResolutionError::Configuration(format!("HTTP client: {}", e)))?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a resolver over a caller-provided transport
    pub fn with_transport(
        config: DriverConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ResolutionError> {
        config.validate()?;

        let client = LoadBalancedClient::new(transport.clone())
            .with_max_retries(config.max_retries)
            .with_request_timeout(config.request_timeout());

        let endpoints = match (config.registry_enabled, &config.registry_url, &config.node_urls) {
            (true, Some(registry_url), _) => {
                EndpointResolver::from_registry_urls(registry_url, client.clone())?
            }
            (false, _, Some(node_urls)) => EndpointResolver::from_node_urls(node_urls)?,
            _ => {
                return Err(ResolutionError::Configuration(
                    "no endpoint source configured".to_string(),
                ))
            }
        };

        let auth = if config.auth_enabled {
            Some(
                AuthTokenCache::new(transport, config.login_url.clone(), config.credentials())
                    .with_refresh_buffer(config.token_refresh_buffer())
                    .with_request_timeout(config.request_timeout()),
            )
        } else {
            None
        };

        Ok(Self { endpoints, auth, client })
    }

    /// Resolves a DID:HPASS identifier
    ///
    /// # Example
    /// ```no_run
    /// use hpass_did_resolver::{DriverConfig, Resolver};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let resolver = Resolver::new(DriverConfig::with_nodes("https://node.example.com/api/v1/dids/$1"))?;
    ///     let did = format!("did:hpass:{}:{}", "a".repeat(64), "b".repeat(64));
    ///     let result = resolver.resolve(&did).await?;
    ///     println!("Resolved DID Document: {:?}", result.did_document);
    ///     Ok(())
    /// }
    /// ```
    pub async fn resolve(&self, did: &str) -> Result<ResolutionResult, ResolutionError> {
        self.resolve_with_cancel(did, &CancellationToken::new()).await
    }

    /// Resolves a DID:HPASS identifier, giving up as soon as `cancel` fires
    pub async fn resolve_with_cancel(
        &self,
        did: &str,
        cancel: &CancellationToken,
    ) -> Result<ResolutionResult, ResolutionError> {
        let start_time = Instant::now();

        let did = HpassDid::parse(did)?;
        let fetched = self.fetch(&did, cancel).await?;
        let (did_document, method_metadata) = build_document(&did, &fetched.body)?;

        let metadata = ResolutionMetadata {
            content_type: "application/did+json".to_string(),
            retrieved: Utc::now(),
            duration: start_time.elapsed(),
            discovery_mode: fetched.discovery_mode,
        };

        Ok(ResolutionResult { did_document, method_metadata, metadata })
    }

    /// Fetches the raw record for a parsed identifier without building a document
    pub async fn fetch(
        &self,
        did: &HpassDid,
        cancel: &CancellationToken,
    ) -> Result<FetchedPayload, ResolutionError> {
        debug!(did = %did, "Discovering endpoints");
        let endpoints = self.endpoints.discover(did, cancel).await?;

        if endpoints.method() != HttpMethod::Get {
            return Err(ResolutionError::ResourceFetchFailure(format!(
                "no valid HTTP method for {}",
                endpoints
            )));
        }

        let mut template = RequestTemplate::new().with_header("Content-Type", "application/json");
        if let Some(auth) = &self.auth {
            debug!(did = %did, "Attaching bearer token");
            let token = auth.authenticate().await?;
            template = template.with_header("Authorization", format!("Bearer {}", token));
        }

        debug!(did = %did, endpoints = %endpoints, "Fetching DID record");
        let response = self.client.request(&template, did.resource_id(), &endpoints, cancel).await?;

        Ok(FetchedPayload { body: response.body, discovery_mode: endpoints.mode() })
    }
}

/// Convenience function resolving a DID with configuration read from the environment
pub async fn resolve_did(did: &str) -> Result<ResolutionResult, ResolutionError> {
    let resolver = Resolver::new(DriverConfig::from_env())?;
    resolver.resolve(did).await
}
