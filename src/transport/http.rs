//! Live transport backed by reqwest

use crate::config::Config;
use crate::error::Result;
use crate::query::RequestSpec;
use crate::transport::{HttpResponse, HttpTransport, TransportError};
use std::time::Duration;

/// reqwest-based transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the given per-request timeout
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.service.user_agent, config.fetch.request_timeout())
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &RequestSpec) -> std::result::Result<HttpResponse, TransportError> {
        let url = format!("{}{}", request.base_url, request.path);

        let mut builder = self.client.get(&url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(classify)?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}
