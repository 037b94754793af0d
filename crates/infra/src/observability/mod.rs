//! Logging setup
//!
//! The SDK only emits `tracing` events. Applications that do not install a
//! subscriber of their own can call [`init_tracing`].

use marketlink_domain::{MarketLinkError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable consulted before the fallback filter
pub const LOG_FILTER_ENV: &str = "MARKETLINK_LOG";

/// Install a fmt subscriber filtered by `MARKETLINK_LOG`, or by `fallback`
/// when the variable is unset (e.g. `"marketlink_infra=debug,info"`).
///
/// Returns `Ok(false)` when a global subscriber was already installed.
///
/// # Errors
/// Returns `MarketLinkError::Config` when the filter directive is invalid.
pub fn init_tracing(fallback: &str) -> Result<bool> {
    let filter = match std::env::var(LOG_FILTER_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(fallback),
    }
    .map_err(|e| MarketLinkError::Config(format!("Invalid log filter: {e}")))?;

    let installed =
        tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init();

    Ok(installed.is_ok())
}
