//! Endpoint and endpoint-set types.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ResolutionError;

/// Token replaced by the path parameter when an endpoint is expanded
pub const URL_PLACEHOLDER: &str = "$1";

/// HTTP methods the driver knows how to issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            other => Err(format!("unsupported HTTP method '{}'", other)),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an endpoint set was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Fixed list from configuration
    Static,
    /// Looked up in the registry for this identifier
    Dynamic,
}

/// A URL template, optionally containing [`URL_PLACEHOLDER`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    template: String,
}

impl Endpoint {
    /// Validates the template as a URL
    pub fn parse(template: &str) -> Result<Self, ResolutionError> {
        let template = template.trim();
        Url::parse(template).map_err(|e| ResolutionError::InvalidEndpoint {
            url: template.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { template: template.to_string() })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Substitutes `parameter` for every placeholder in the template
    pub fn expand(&self, parameter: &str) -> String {
        self.template.replace(URL_PLACEHOLDER, parameter)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Ordered, never-empty list of candidate endpoints plus the method to use against them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet {
    endpoints: Vec<Endpoint>,
    method: HttpMethod,
    mode: DiscoveryMode,
}

impl EndpointSet {
    pub fn new(
        endpoints: Vec<Endpoint>,
        method: HttpMethod,
        mode: DiscoveryMode,
    ) -> Result<Self, ResolutionError> {
        if endpoints.is_empty() {
            return Err(ResolutionError::Configuration(
                "endpoint set must contain at least one URL".to_string(),
            ));
        }
        Ok(Self { endpoints, method, mode })
    }

    /// Builds a set from a comma-separated URL list, skipping blank items
    pub fn from_url_list(
        list: &str,
        method: HttpMethod,
        mode: DiscoveryMode,
    ) -> Result<Self, ResolutionError> {
        let endpoints = list
            .split(',')
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(Endpoint::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(endpoints, method, mode)
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false, a set holds at least one endpoint
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl fmt::Display for EndpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.method)?;
        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", endpoint)?;
        }
        f.write_str("]")
    }
}
