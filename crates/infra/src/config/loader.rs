//! Configuration loader
//!
//! Loads SDK configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Loads a `.env` file from the working directory, if present
//! 2. Attempts to load from environment variables
//! 3. If `MARKETLINK_API_BASE_URL` is unset, falls back to loading from file
//! 4. Probes multiple paths for config files (JSON and TOML)
//!
//! ## Environment Variables
//! - `MARKETLINK_API_BASE_URL`: Backend base URL (required)
//! - `MARKETLINK_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `MARKETLINK_USER_AGENT`: `User-Agent` header value
//! - `MARKETLINK_REFRESH_PATH`: Session refresh endpoint path
//! - `MARKETLINK_LANDING_ROUTE`: Route to navigate to when the session ends
//!   (empty disables navigation)
//! - `MARKETLINK_STORAGE_PATH`: JSON file for the stored session (unset keeps
//!   it in memory)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}`, then `./marketlink.{json,toml}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use marketlink_domain::{Config, MarketLinkError, Result};

pub const ENV_BASE_URL: &str = "MARKETLINK_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "MARKETLINK_API_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "MARKETLINK_USER_AGENT";
pub const ENV_REFRESH_PATH: &str = "MARKETLINK_REFRESH_PATH";
pub const ENV_LANDING_ROUTE: &str = "MARKETLINK_LANDING_ROUTE";
pub const ENV_STORAGE_PATH: &str = "MARKETLINK_STORAGE_PATH";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["config.json", "config.toml", "marketlink.json", "marketlink.toml"];

/// Load configuration with automatic fallback strategy
///
/// Reads `.env` first, then the environment, then a config file. The result
/// is validated before it is returned.
///
/// # Errors
/// Returns `MarketLinkError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Validation fails
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// Only `MARKETLINK_API_BASE_URL` is required; every other setting falls
/// back to its default.
///
/// # Errors
/// Returns `MarketLinkError::Config` if the base URL is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::for_base_url(env_var(ENV_BASE_URL)?);

    if let Some(raw) = optional_env_var(ENV_TIMEOUT_SECS) {
        config.api.timeout_secs = raw.parse::<u64>().map_err(|e| {
            MarketLinkError::Config(format!("Invalid {ENV_TIMEOUT_SECS} '{raw}': {e}"))
        })?;
    }
    if let Some(agent) = optional_env_var(ENV_USER_AGENT) {
        config.api.user_agent = agent;
    }
    if let Some(path) = optional_env_var(ENV_REFRESH_PATH) {
        config.session.refresh_path = path;
    }
    if let Ok(route) = std::env::var(ENV_LANDING_ROUTE) {
        let route = route.trim();
        config.session.landing_route = (!route.is_empty()).then(|| route.to_string());
    }
    config.storage.path = optional_env_var(ENV_STORAGE_PATH);

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MarketLinkError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MarketLinkError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MarketLinkError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MarketLinkError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `MarketLinkError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MarketLinkError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MarketLinkError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MarketLinkError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `MarketLinkError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    optional_env_var(key).ok_or_else(|| {
        MarketLinkError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Non-empty value of an environment variable
fn optional_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Mutex, PoisonError};

    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: [&str; 6] = [
        ENV_BASE_URL,
        ENV_TIMEOUT_SECS,
        ENV_USER_AGENT,
        ENV_REFRESH_PATH,
        ENV_LANDING_ROUTE,
        ENV_STORAGE_PATH,
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        clear_env();

        std::env::set_var(ENV_BASE_URL, "https://api.example.com/v1");
        std::env::set_var(ENV_TIMEOUT_SECS, "12");
        std::env::set_var(ENV_USER_AGENT, "marketlink-web/2.0");
        std::env::set_var(ENV_REFRESH_PATH, "/auth/token/refresh");
        std::env::set_var(ENV_LANDING_ROUTE, "/signin");
        std::env::set_var(ENV_STORAGE_PATH, "/tmp/marketlink/session.json");

        let result = load_from_env();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com/v1");
        assert_eq!(config.api.timeout_secs, 12);
        assert_eq!(config.api.user_agent, "marketlink-web/2.0");
        assert_eq!(config.session.refresh_path, "/auth/token/refresh");
        assert_eq!(config.session.landing_route.as_deref(), Some("/signin"));
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/marketlink/session.json"));
    }

    #[test]
    fn test_load_from_env_defaults() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        clear_env();

        std::env::set_var(ENV_BASE_URL, "http://localhost:4000");
        let result = load_from_env();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config, Config::for_base_url("http://localhost:4000"));
    }

    #[test]
    fn test_empty_landing_route_disables_navigation() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        clear_env();

        std::env::set_var(ENV_BASE_URL, "http://localhost:4000");
        std::env::set_var(ENV_LANDING_ROUTE, "");
        let result = load_from_env();
        clear_env();

        assert!(result.unwrap().session.landing_route.is_none());
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, MarketLinkError::Config(ref msg) if msg.contains(ENV_BASE_URL)));
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        clear_env();

        std::env::set_var(ENV_BASE_URL, "http://localhost:4000");
        std::env::set_var(ENV_TIMEOUT_SECS, "soon");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(MarketLinkError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "api": { "base_url": "https://api.example.com", "timeout_secs": 8 },
            "storage": { "path": "session.json" }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        std::fs::remove_file(path).ok();

        let config = result.unwrap();
        assert_eq!(config.api.timeout_secs, 8);
        assert_eq!(config.storage.path.as_deref(), Some("session.json"));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));

        assert!(matches!(result, Err(MarketLinkError::Config(_))), "Should be a Config error");
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_content = r#"
[api]
base_url = "https://api.example.com"

[session]
landing_route = "/welcome"
"#;

        let config = parse_config(toml_content, Path::new("marketlink.toml")).unwrap();
        assert_eq!(config.session.landing_route.as_deref(), Some("/welcome"));
    }

    #[test]
    fn test_parse_config_invalid_json() {
        let result = parse_config(r#"{ "api": "#, Path::new("config.json"));
        assert!(result.is_err(), "Should fail with invalid JSON");
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("api: {}", Path::new("config.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
