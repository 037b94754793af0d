//! SDK constants
//!
//! Endpoint paths and defaults shared by the config layer and the client.

// Backend endpoints
pub const REFRESH_PATH: &str = "/auth/refresh";
pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const VERIFY_EMAIL_PATH: &str = "/auth/verify-email";
pub const RESEND_VERIFICATION_PATH: &str = "/auth/resend-verification";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

/// Paths whose 401 responses are never refreshed-and-retried.
pub const AUTH_EXEMPT_PATHS: [&str; 7] = [
    LOGIN_PATH,
    REGISTER_PATH,
    VERIFY_EMAIL_PATH,
    RESEND_VERIFICATION_PATH,
    FORGOT_PASSWORD_PATH,
    RESET_PASSWORD_PATH,
    REFRESH_PATH,
];

// Client defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("marketlink-sdk/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_LANDING_ROUTE: &str = "/login";
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

pub const BEARER_PREFIX: &str = "Bearer ";
