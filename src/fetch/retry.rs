//! Fixed-backoff retry around a single HTTP request

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::query::RequestSpec;
use crate::transport::{HttpResponse, HttpTransport, TransportError};
use std::time::Duration;
use tracing::{debug, warn};

/// How hard to try one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Pause before each retry
    pub backoff: Duration,
    /// Limit on each individual attempt
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.retry_backoff(),
            timeout: config.request_timeout(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Issue `request`, retrying transport failures, timeouts and 5xx
///
/// 2xx responses are returned. 400 and 422 mean the service rejected the
/// query and map to `InvalidQuery`; any other non-success status is an
/// immediate `UpstreamUnavailable`. Exhausted retries yield
/// `UpstreamUnavailable` carrying the last failure.
pub async fn send_with_retry<T: HttpTransport>(
    transport: &T,
    request: &RequestSpec,
    policy: &RetryPolicy,
) -> Result<HttpResponse> {
    let url = request.url();
    let mut attempt: u32 = 0;

    loop {
        let (message, status) = match tokio::time::timeout(policy.timeout, transport.get(request)).await
        {
            Ok(Ok(response)) if response.is_success() => return Ok(response),
            Ok(Ok(response)) if response.is_server_error() => {
                (format!("status {}", response.status), Some(response.status))
            }
            Ok(Ok(response)) => return Err(rejected(&url, response.status)),
            Ok(Err(err)) => (err.to_string(), None),
            Err(_) => (TransportError::Timeout.to_string(), None),
        };

        if attempt >= policy.max_retries {
            warn!(url = %url, attempts = attempt + 1, "giving up: {}", message);
            return Err(Error::UpstreamUnavailable {
                message: format!("{} failed after {} attempt(s): {}", url, attempt + 1, message),
                status,
            });
        }

        attempt += 1;
        debug!(url = %url, attempt, "retrying after {}", message);
        tokio::time::sleep(policy.backoff).await;
    }
}

fn rejected(url: &str, status: u16) -> Error {
    match status {
        400 | 422 => Error::InvalidQuery(format!("service rejected {} with status {}", url, status)),
        _ => Error::UpstreamUnavailable {
            message: format!("{} returned status {}", url, status),
            status: Some(status),
        },
    }
}
