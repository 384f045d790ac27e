//! Endpoint discovery for DID:HPASS networks.
//!
//! Nodes are either listed in configuration (static mode) or looked up per
//! identifier in a registry (dynamic mode). The registry is queried on every
//! resolution; results are not cached across calls.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::balancer::{LoadBalancedClient, RequestTemplate};
use super::endpoint::{DiscoveryMode, Endpoint, EndpointSet, HttpMethod};
use crate::did::HpassDid;
use crate::error::{DiscoveryError, ResolutionError};

const REGISTRY_PAYLOAD: &str = "payload";
const REGISTRY_ENVIRONMENTS: &str = "environments";
const REGISTRY_TYPE: &str = "type";
const REGISTRY_TYPE_REST: &str = "REST";
const REGISTRY_METADATA: &str = "metadata";
const REGISTRY_URLS: &str = "urls";
const REGISTRY_METHOD: &str = "method";

enum EndpointSource {
    Static(EndpointSet),
    Registry { registry: EndpointSet, client: LoadBalancedClient },
}

/// Determines the candidate endpoint set for an identifier
pub struct EndpointResolver {
    source: EndpointSource,
}

impl std::fmt::Debug for EndpointResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            EndpointSource::Static(nodes) => {
                f.debug_struct("EndpointResolver").field("static", nodes).finish()
            }
            EndpointSource::Registry { registry, .. } => {
                f.debug_struct("EndpointResolver").field("registry", registry).finish()
            }
        }
    }
}

impl EndpointResolver {
    /// Static mode over a comma-separated list of node URL templates
    ///
    /// Malformed URLs fail here rather than on each resolution.
    pub fn from_node_urls(node_urls: &str) -> Result<Self, ResolutionError> {
        let nodes = EndpointSet::from_url_list(node_urls, HttpMethod::Get, DiscoveryMode::Static)?;
        info!(endpoints = %nodes, "Initialized static network endpoints");
        Ok(Self { source: EndpointSource::Static(nodes) })
    }

    /// Dynamic mode: the registry URL templates receive the identifier's registry key
    pub fn from_registry_urls(
        registry_urls: &str,
        client: LoadBalancedClient,
    ) -> Result<Self, ResolutionError> {
        let registry =
            EndpointSet::from_url_list(registry_urls, HttpMethod::Get, DiscoveryMode::Static)?;
        info!(endpoints = %registry, "Initialized registry endpoints");
        Ok(Self { source: EndpointSource::Registry { registry, client } })
    }

    pub fn mode(&self) -> DiscoveryMode {
        match self.source {
            EndpointSource::Static(_) => DiscoveryMode::Static,
            EndpointSource::Registry { .. } => DiscoveryMode::Dynamic,
        }
    }

    /// Returns the endpoints that serve `did`
    ///
    /// # Errors
    /// * [`DiscoveryError::RegistryUnreachable`] when every registry attempt failed
    /// * [`DiscoveryError::RegistryResponseInvalid`] for an empty, non-JSON or incomplete body
    /// * [`DiscoveryError::NoUsableEndpoint`] when no REST environment lists a method and URLs
    pub async fn discover(
        &self,
        did: &HpassDid,
        cancel: &CancellationToken,
    ) -> Result<EndpointSet, ResolutionError> {
        let (registry, client) = match &self.source {
            EndpointSource::Static(nodes) => return Ok(nodes.clone()),
            EndpointSource::Registry { registry, client } => (registry, client),
        };

        let key = did.registry_key();
        debug!(registry_key = key, "Querying registry for network endpoints");

        let response = client
            .request(&RequestTemplate::new(), key, registry, cancel)
            .await
            .map_err(|e| match e {
                ResolutionError::RetryExhausted { message, .. } => {
                    DiscoveryError::RegistryUnreachable(message).into()
                }
                other => other,
            })?;

        let endpoints = parse_registry_response(&response.body)?;
        info!(did = %did, endpoints = %endpoints, "Selected network endpoints from registry");
        Ok(endpoints)
    }
}

/// Collects the URLs and method of every REST environment in a registry response.
///
/// URLs from all REST entries are concatenated in order. When entries declare
/// different methods the last one wins.
pub fn parse_registry_response(body: &str) -> Result<EndpointSet, DiscoveryError> {
    if body.trim().is_empty() {
        return Err(DiscoveryError::RegistryResponseInvalid("empty body".to_string()));
    }
    let response: Value = serde_json::from_str(body)
        .map_err(|e| DiscoveryError::RegistryResponseInvalid(e.to_string()))?;

    let environments = response
        .get(REGISTRY_PAYLOAD)
        .and_then(|payload| payload.get(REGISTRY_ENVIRONMENTS))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            DiscoveryError::RegistryResponseInvalid(format!(
                "missing '{}.{}' array",
                REGISTRY_PAYLOAD, REGISTRY_ENVIRONMENTS
            ))
        })?;

    let mut urls = Vec::new();
    let mut method: Option<&str> = None;

    let rest_entries = environments
        .iter()
        .filter(|env| env.get(REGISTRY_TYPE).and_then(Value::as_str) == Some(REGISTRY_TYPE_REST));

    for environment in rest_entries {
        let Some(metadata) = environment.get(REGISTRY_METADATA) else {
            continue;
        };
        if let Some(list) = metadata.get(REGISTRY_URLS).and_then(Value::as_array) {
            for url in list {
                let url = url.as_str().ok_or_else(|| {
                    DiscoveryError::RegistryResponseInvalid(format!("non-string URL {}", url))
                })?;
                let endpoint = Endpoint::parse(url)
                    .map_err(|e| DiscoveryError::RegistryResponseInvalid(e.to_string()))?;
                urls.push(endpoint);
            }
        }
        if let Some(declared) = metadata.get(REGISTRY_METHOD).and_then(Value::as_str) {
            method = Some(declared);
        }
    }

    let method = method.ok_or_else(|| {
        DiscoveryError::NoUsableEndpoint("no REST environment declares a method".to_string())
    })?;
    let method = method.parse::<HttpMethod>().map_err(DiscoveryError::NoUsableEndpoint)?;
    if urls.is_empty() {
        return Err(DiscoveryError::NoUsableEndpoint(
            "no REST environment lists any URL".to_string(),
        ));
    }

    EndpointSet::new(urls, method, DiscoveryMode::Dynamic)
        .map_err(|e| DiscoveryError::NoUsableEndpoint(e.to_string()))
}
