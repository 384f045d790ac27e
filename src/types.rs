//! Core types for DID:HPASS resolution.
//!
//! This module provides the DID Document returned to callers together with
//! the method and resolution metadata that accompany it.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::network::DiscoveryMode;

/// A DID Document as defined in the DID Core specification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DIDDocument {
    /// The context of the DID Document
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// The DID itself
    pub id: String,

    /// Verification methods associated with this DID
    #[serde(rename = "verificationMethod")]
    pub verification_method: Vec<VerificationMethod>,
}

/// A verification method in a DID Document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// The unique identifier for this verification method
    pub id: String,

    /// The type of the verification method
    #[serde(rename = "type")]
    pub method_type: String,

    /// The controller of this verification method
    pub controller: serde_json::Value,

    /// The public key as a JSON Web Key
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "publicKeyJwk")]
    pub public_key_jwk: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Method-specific metadata taken from the network payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMetadata {
    /// Creation time, `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Last update time, `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

/// Resolution result containing the DID Document and metadata
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// The resolved DID Document
    pub did_document: DIDDocument,

    /// Metadata published with the DID on the network
    pub method_metadata: MethodMetadata,

    /// Metadata about the resolution process
    pub metadata: ResolutionMetadata,
}

/// Metadata about the resolution process
#[derive(Debug, Clone)]
pub struct ResolutionMetadata {
    /// Content type of the resolved document
    pub content_type: String,

    /// When the document was retrieved
    pub retrieved: DateTime<Utc>,

    /// How long the resolution took
    pub duration: std::time::Duration,

    /// Whether the nodes came from configuration or from the registry
    pub discovery_mode: DiscoveryMode,
}
