//! Load-balanced request dispatch.
//!
//! A request is tried against the endpoints of an [`EndpointSet`] in
//! round-robin order. Transport errors, timeouts and non-2xx statuses move
//! the cursor to the next endpoint; the first 2xx response wins. The number
//! of attempts is bounded by `max_retries + 1` regardless of the set size.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::endpoint::{EndpointSet, HttpMethod};
use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::ResolutionError;

/// Additional attempts after the first one
pub const DEFAULT_MAX_RETRIES: usize = 10;
/// Upper bound for a single attempt
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Headers applied to every attempt of a load-balanced request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestTemplate {
    headers: Vec<(String, String)>,
}

impl RequestTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, replacing any previous value with the same name
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn build(&self, method: HttpMethod, url: String) -> HttpRequest {
        HttpRequest { method, url, headers: self.headers.clone(), body: None }
    }
}

/// Position in the endpoint list for one outer request
#[derive(Debug)]
struct RotationCursor {
    index: usize,
    len: usize,
}

impl RotationCursor {
    fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    fn current(&self) -> usize {
        self.index
    }

    fn advance(&mut self) {
        self.index = (self.index + 1) % self.len;
    }
}

/// Issues requests over an endpoint set with bounded, rotating retry
#[derive(Clone)]
pub struct LoadBalancedClient {
    transport: Arc<dyn HttpTransport>,
    max_retries: usize,
    request_timeout: Duration,
}

impl std::fmt::Debug for LoadBalancedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadBalancedClient")
            .field("max_retries", &self.max_retries)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl LoadBalancedClient {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Sends the request to the endpoints in turn until one answers with 2xx
    ///
    /// `path_parameter` replaces the placeholder of each endpoint template.
    /// The body of the successful response is returned as-is.
    ///
    /// # Errors
    /// * [`ResolutionError::RetryExhausted`] once `max_retries + 1` attempts failed
    /// * [`ResolutionError::Cancelled`] if `cancel` fires before a success
    pub async fn request(
        &self,
        template: &RequestTemplate,
        path_parameter: &str,
        endpoints: &EndpointSet,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, ResolutionError> {
        let total_attempts = self.max_retries.saturating_add(1);
        let mut cursor = RotationCursor::new(endpoints.len());
        let mut last_failure: Option<(Option<u16>, String)> = None;

        for attempt in 1..=total_attempts {
            if cancel.is_cancelled() {
                return Err(ResolutionError::Cancelled);
            }

            let endpoint = &endpoints.endpoints()[cursor.current()];
            let url = endpoint.expand(path_parameter);
            let request = template.build(endpoints.method(), url.clone());

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResolutionError::Cancelled),
                outcome = tokio::time::timeout(self.request_timeout, self.transport.send(request)) => outcome,
            };

            let failure = match outcome {
                Ok(Ok(response)) if response.is_success() => {
                    debug!(attempt, url = %url, status = response.status, "Request succeeded");
                    return Ok(response);
                }
                Ok(Ok(response)) => {
                    (Some(response.status), format!("HTTP {} from {}", response.status, url))
                }
                Ok(Err(e)) => (None, format!("{} ({})", e, url)),
                Err(_) => (
                    None,
                    format!("timed out after {}ms ({})", self.request_timeout.as_millis(), url),
                ),
            };

            warn!(
                attempt,
                max_attempts = total_attempts,
                endpoint = %endpoint,
                status = ?failure.0,
                error = %failure.1,
                "Request attempt failed, rotating endpoint"
            );
            last_failure = Some(failure);
            cursor.advance();
        }

        let (last_status, message) =
            last_failure.unwrap_or((None, "no attempt was made".to_string()));
        error!(
            attempts = total_attempts,
            endpoints = %endpoints,
            last_status = ?last_status,
            "Retry budget exhausted"
        );
        Err(ResolutionError::RetryExhausted { attempts: total_attempts, last_status, message })
    }
}
