//! # MarketLink Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest transport
//! - The authenticated API client, refresh client, and typed API calls
//! - The JSON file credential store
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `marketlink-core`
//! - Depends on `marketlink-domain` and `marketlink-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use api::{
    ApiClient, ApiClientBuilder, ApiError, ApiErrorCategory, AuthApi, HttpRefreshClient,
    RequestOptions, ResourceApi,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use storage::FileCredentialStore;
