//! MarketLink backend API
//!
//! This module provides the authenticated API client and the typed calls
//! built on it.
//!
//! # Architecture
//!
//! - [`ApiClient`] runs every call through `[BearerAuth, SessionRefresh]`
//!   around the reqwest [`HttpClient`](crate::http::HttpClient)
//! - [`HttpRefreshClient`] calls the refresh endpoint on the bare transport
//! - [`AuthApi`] covers login, registration, verification and password reset
//! - [`ResourceApi`] covers the marketplace collections

pub mod auth;
pub mod client;
pub mod errors;
pub mod refresh;
pub mod resources;

pub use auth::{AuthApi, AuthResponse, LoginRequest, RegisterRequest};
pub use client::{ApiClient, ApiClientBuilder, RequestOptions};
pub use errors::{ApiError, ApiErrorCategory};
pub use refresh::HttpRefreshClient;
pub use resources::ResourceApi;
