//! DID parsing functionality.
//!
//! This module handles the parsing and validation of DID:HPASS identifiers and
//! exposes the segments used to address the registry and the network nodes.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ResolutionError;

static DID_HPASS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^did:hpass:([0-9A-Fa-f]{60,65}):([0-9A-Fa-fts]{60,65})$")
        .expect("DID:HPASS pattern is a valid regex")
});

/// Represents a parsed DID:HPASS identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HpassDid {
    did: String,
    network_id: String,
    resource_id: String,
}

impl HpassDid {
    /// Parses and validates a DID:HPASS string
    pub fn parse(did: &str) -> Result<Self, ResolutionError> {
        let captures = DID_HPASS_PATTERN
            .captures(did)
            .ok_or_else(|| ResolutionError::IdentifierMalformed(did.to_string()))?;

        Ok(Self {
            did: did.to_string(),
            network_id: captures[1].to_string(),
            resource_id: captures[2].to_string(),
        })
    }

    /// The network segment naming which registry entry to query
    pub fn network_id(&self) -> &str {
        &self.network_id
    }

    /// The segment naming the record on the network
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Everything before the last delimiter, e.g. `did:hpass:<network-id>`.
    ///
    /// This is the value substituted into the registry URL template.
    pub fn registry_key(&self) -> &str {
        match self.did.rfind(':') {
            Some(idx) => &self.did[..idx],
            None => &self.did,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.did
    }
}

impl fmt::Display for HpassDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.did)
    }
}
