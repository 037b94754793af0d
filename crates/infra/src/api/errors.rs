//! API-specific error types
//!
//! Classifies failed calls by cause. Errors produced from an HTTP status keep
//! the status code.

use std::time::Duration;

use marketlink_domain::MarketLinkError;
use thiserror::Error;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Authentication errors (401, 403, failed session refresh)
    Authentication,
    /// Rate limiting errors (429)
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except auth)
    Client,
    /// Network/connection errors and timeouts
    Network,
    /// Configuration errors
    Config,
    /// Credential storage errors
    Storage,
    /// Response body did not match the expected shape
    Decode,
    /// Bugs and unexpected states
    Internal,
}

/// API operation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { status: Option<u16>, message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimit { status: u16, message: String },

    #[error("Server error: {message}")]
    Server { status: u16, message: String },

    #[error("Client error: {message}")]
    Client { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Classify a non-2xx response.
    ///
    /// 401/403 map to `Auth`, 429 to `RateLimit`, 5xx to `Server`, every other
    /// status to `Client`.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth { status: Some(status), message },
            429 => Self::RateLimit { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Client { status, message },
        }
    }

    /// Get the error category for this error
    pub const fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Auth { .. } => ApiErrorCategory::Authentication,
            Self::RateLimit { .. } => ApiErrorCategory::RateLimit,
            Self::Server { .. } => ApiErrorCategory::Server,
            Self::Client { .. } => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Config(_) => ApiErrorCategory::Config,
            Self::Storage(_) => ApiErrorCategory::Storage,
            Self::Decode(_) => ApiErrorCategory::Decode,
            Self::Internal(_) => ApiErrorCategory::Internal,
        }
    }

    /// HTTP status the error was produced from, if any.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } => *status,
            Self::RateLimit { status, .. }
            | Self::Server { status, .. }
            | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend rejected the credentials (HTTP 401).
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth { status: Some(401), .. })
    }

    /// Whether the caller may reasonably try the same call again later.
    ///
    /// The client itself never retries these.
    pub const fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }
}

impl From<MarketLinkError> for ApiError {
    fn from(err: MarketLinkError) -> Self {
        match err {
            MarketLinkError::Network(message) => Self::Network(message),
            MarketLinkError::Auth(message) => Self::Auth { status: None, message },
            MarketLinkError::Config(message) => Self::Config(message),
            MarketLinkError::Storage(message) => Self::Storage(message),
            MarketLinkError::NotFound(message)
            | MarketLinkError::InvalidInput(message)
            | MarketLinkError::Internal(message) => Self::Internal(message),
        }
    }
}
