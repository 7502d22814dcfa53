//! HTTP transport
//!
//! The fetcher talks to the service only through [`HttpTransport`], so it
//! can run against the live site ([`http::ReqwestTransport`]) or a scripted
//! stand-in ([`stub::StubTransport`]).

pub mod http;
pub mod stub;

use crate::query::RequestSpec;
use thiserror::Error;

pub use http::ReqwestTransport;
pub use stub::StubTransport;

/// A completed HTTP exchange, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure below the HTTP layer: nothing usable came back
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Trait for HTTP transports
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request and return the response regardless of status
    fn get(
        &self,
        request: &RequestSpec,
    ) -> impl std::future::Future<Output = std::result::Result<HttpResponse, TransportError>> + Send;
}
