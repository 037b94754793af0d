//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use marketlink_domain::MarketLinkError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MarketLinkError);

impl From<InfraError> for MarketLinkError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MarketLinkError> for InfraError {
    fn from(value: MarketLinkError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoMarketLinkError {
    fn into_marketlink(self) -> MarketLinkError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MarketLinkError */
/* -------------------------------------------------------------------------- */

impl IntoMarketLinkError for HttpError {
    fn into_marketlink(self) -> MarketLinkError {
        if self.is_timeout() {
            return MarketLinkError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return MarketLinkError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return MarketLinkError::Config(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return MarketLinkError::Internal(format!("failed to decode HTTP response: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => MarketLinkError::Auth(message),
                404 => MarketLinkError::NotFound(message),
                400..=499 => MarketLinkError::InvalidInput(message),
                _ => MarketLinkError::Network(message),
            };
        }

        MarketLinkError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_marketlink())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → MarketLinkError */
/* -------------------------------------------------------------------------- */

impl IntoMarketLinkError for IoError {
    fn into_marketlink(self) -> MarketLinkError {
        match self.kind() {
            ErrorKind::NotFound => MarketLinkError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                MarketLinkError::Storage(format!("permission denied: {self}"))
            }
            _ => MarketLinkError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_marketlink())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → MarketLinkError */
/* -------------------------------------------------------------------------- */

impl IntoMarketLinkError for JsonError {
    fn into_marketlink(self) -> MarketLinkError {
        if self.is_io() {
            return MarketLinkError::Storage(format!("JSON I/O failure: {self}"));
        }
        MarketLinkError::InvalidInput(format!(
            "malformed JSON at line {} column {}: {self}",
            self.line(),
            self.column()
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        Self(value.into_marketlink())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
