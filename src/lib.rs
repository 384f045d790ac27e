//! A resolver implementation for the DID:HPASS method.
//!
//! DID:HPASS records live on REST nodes of a health-pass network. The nodes
//! are either configured statically or looked up in a registry keyed by the
//! network segment of the identifier. Requests are load balanced across the
//! nodes with bounded failover, and a cached bearer token is attached when
//! authentication is enabled.

mod config;
mod did;
mod document;
mod error;
mod resolver;
mod types;

pub mod logging;
pub mod network;

pub use config::DriverConfig;
pub use did::HpassDid;
pub use document::build_document;
pub use error::{AuthError, DiscoveryError, ErrorKind, ResolutionError};
pub use resolver::{resolve_did, FetchedPayload, Resolver};
pub use types::{
    DIDDocument,
    MethodMetadata,
    ResolutionMetadata,
    ResolutionResult,
    VerificationMethod,
};

/// Resolves a DID:HPASS identifier with the given configuration
///
/// # Arguments
/// * `did` - The DID:HPASS identifier to resolve
/// * `config` - Node, registry and authentication settings
///
/// # Example
/// ```no_run
/// use hpass_did_resolver::{resolve, DriverConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DriverConfig::with_registry("https://registry.example.com/networks/$1");
///     let did = format!("did:hpass:{}:{}", "a".repeat(64), "b".repeat(64));
///     let result = resolve(&did, config).await?;
///
///     println!("Resolved DID Document: {:?}", result.did_document);
///     Ok(())
/// }
/// ```
pub async fn resolve(did: &str, config: DriverConfig) -> Result<ResolutionResult, ResolutionError> {
    Resolver::new(config)?.resolve(did).await
}
