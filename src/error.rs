//! Error types for trail-scout

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for trail-scout operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        message: String,
        /// Last HTTP status seen, if the service answered at all
        status: Option<u16>,
    },

    #[error("Unparsable response: {message}")]
    UnparsableResponse {
        message: String,
        /// Leading slice of the offending page, for diagnosis
        sample: String,
    },

    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    #[error("Nothing to export: at least one trail is required")]
    EmptyExport,

    #[error("Search cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Coarse classification of an [`Error`], stable across versions
///
/// This is what the tool and HTTP layers expose to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidQuery,
    UpstreamUnavailable,
    UnparsableResponse,
    MalformedGeometry,
    EmptyExport,
    Cancelled,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::InvalidQuery => "invalid_query",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::UnparsableResponse => "unparsable_response",
            Self::MalformedGeometry => "malformed_geometry",
            Self::EmptyExport => "empty_export",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

impl Error {
    /// Shorthand for an upstream failure without a status code
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
            status: None,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::UpstreamUnavailable { .. } | Self::Http(_) => ErrorKind::UpstreamUnavailable,
            Self::UnparsableResponse { .. } => ErrorKind::UnparsableResponse,
            Self::MalformedGeometry(_) => ErrorKind::MalformedGeometry,
            Self::EmptyExport => ErrorKind::EmptyExport,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Server(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller may reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamUnavailable
    }
}

/// Result type alias for trail-scout operations
pub type Result<T> = std::result::Result<T, Error>;
