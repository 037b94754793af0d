//! # MarketLink Core
//!
//! Transport-neutral client logic - no network or filesystem code.
//!
//! This crate contains:
//! - The request/response model and the middleware pipeline
//! - Session ports (credential store, token refresher, navigator)
//! - The session manager with its single-flight refresh
//! - Bearer attachment and refresh-and-retry middlewares
//!
//! ## Architecture Principles
//! - Only depends on `marketlink-domain`
//! - No HTTP client, storage, or platform code
//! - All external effects via traits

pub mod http;
pub mod session;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export the types every client wires together
pub use http::{ApiRequest, ApiResponse, HttpMethod, Middleware, Next, Pipeline, Transport};
pub use session::{
    BearerAuth, CredentialStore, MemoryCredentialStore, Navigator, Renewal, SessionManager,
    SessionRefresh, TokenRefresher,
};
