//! Client configuration module.
//!
//! Handles loading, validating, and layering a `recipe-client.toml` file on
//! top of stock defaults. Every key is optional; a config file only needs to
//! name what it overrides.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! api_base = "http://localhost:8000/api" # Base URL every API path is joined onto
//! app_name = "Recipes"       # Suffix used by page titles
//!
//! [auth]
//! url = "http://localhost:54321/auth/v1"
//! anon_key = ""
//! refresh_lookahead_secs = 300   # Refresh proactively this close to expiry
//! cookie_name = "sb-access-token"
//! public_routes = ["/", "/login", "/signup"]
//! home_route = "/"
//! protected_prefixes = ["/profile", "/recipes/create"]
//!
//! [images]
//! max_width = 1920
//! max_height = 1080
//! target_size_kb = 1024
//! max_upload_bytes = 10485760
//!
//! [cache]
//! profile_ttl_secs = 60
//!
//! [notifications]
//! default_duration_ms = 5000
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Client configuration loaded from TOML.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL the API paths are resolved against.
    pub api_base: String,
    /// Application name, used by [`page_title`](crate::format::page_title).
    pub app_name: String,
    /// Session provider endpoint, refresh policy and route lists.
    pub auth: AuthConfig,
    /// Upload compression bounds.
    pub images: ImagesConfig,
    /// Cache lifetimes.
    pub cache: CacheConfig,
    /// Toast defaults.
    pub notifications: NotificationsConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000/api".to_string(),
            app_name: "Recipes".to_string(),
            auth: AuthConfig::default(),
            images: ImagesConfig::default(),
            cache: CacheConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [("api_base", &self.api_base), ("auth.url", &self.auth.url)] {
            let parsed = url::Url::parse(value)
                .map_err(|e| ConfigError::Validation(format!("{key} is not a valid URL: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "{key} must be an http or https URL"
                )));
            }
        }
        if self.auth.refresh_lookahead_secs == 0 {
            return Err(ConfigError::Validation(
                "auth.refresh_lookahead_secs must be non-zero".into(),
            ));
        }
        if !self.auth.home_route.starts_with('/') {
            return Err(ConfigError::Validation(
                "auth.home_route must start with '/'".into(),
            ));
        }
        if self.images.max_width == 0 || self.images.max_height == 0 {
            return Err(ConfigError::Validation(
                "images.max_width and images.max_height must be non-zero".into(),
            ));
        }
        if self.images.target_size_kb == 0 {
            return Err(ConfigError::Validation(
                "images.target_size_kb must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Session provider and route settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Auth service base URL (`/token`, `/logout` are joined onto it).
    pub url: String,
    /// Public API key sent as the `apikey` header to the auth service.
    pub anon_key: String,
    /// A token expiring within this many seconds is refreshed before use.
    pub refresh_lookahead_secs: u64,
    /// Base name of the persisted session cookie (chunks append `.0`..`.4`).
    pub cookie_name: String,
    /// Routes a signed-out user may stay on after an auth failure.
    pub public_routes: Vec<String>,
    /// Where signed-out users are sent.
    pub home_route: String,
    /// Path prefixes that require a signed-in user.
    pub protected_prefixes: Vec<String>,
}

impl AuthConfig {
    pub fn refresh_lookahead(&self) -> Duration {
        Duration::from_secs(self.refresh_lookahead_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321/auth/v1".to_string(),
            anon_key: String::new(),
            refresh_lookahead_secs: 300,
            cookie_name: "sb-access-token".to_string(),
            public_routes: vec!["/".into(), "/login".into(), "/signup".into()],
            home_route: "/".to_string(),
            protected_prefixes: vec!["/profile".into(), "/recipes/create".into()],
        }
    }
}

/// Upload compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// Byte budget for the compressed upload, in KiB.
    pub target_size_kb: u32,
    /// Files larger than this are rejected before compression.
    pub max_upload_bytes: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            target_size_kb: 1024,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// How long a fetched profile is served from memory.
    pub profile_ttl_secs: u64,
}

impl CacheConfig {
    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            profile_ttl_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Auto-dismiss delay for success, error and warning toasts.
    pub default_duration_ms: u64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 5000,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ClientConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a config document, layer it over stock defaults and validate.
pub fn parse_config(content: &str) -> Result<ClientConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: ClientConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file, or stock defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    match path {
        Some(path) => parse_config(&fs::read_to_string(path)?),
        None => Ok(ClientConfig::default()),
    }
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Recipe Client Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Base URL every API path is joined onto.
api_base = "http://localhost:8000/api"

# Application name, appended to page titles ("Title | Recipes").
app_name = "Recipes"

# ---------------------------------------------------------------------------
# Authentication
# ---------------------------------------------------------------------------
[auth]
# Auth service base URL. Refresh posts to <url>/token, sign-out to <url>/logout.
url = "http://localhost:54321/auth/v1"

# Public key sent as the `apikey` header to the auth service.
anon_key = ""

# Access tokens expiring within this many seconds are refreshed before use.
refresh_lookahead_secs = 300

# Base name of the persisted session cookie. Large sessions are split into
# <name>.0 .. <name>.4 and concatenated back in index order.
cookie_name = "sb-access-token"

# Routes a user may stay on after a failed refresh signs them out.
public_routes = ["/", "/login", "/signup"]

# Where signed-out users are redirected.
home_route = "/"

# Path prefixes that require a signed-in user.
protected_prefixes = ["/profile", "/recipes/create"]

# ---------------------------------------------------------------------------
# Image uploads
# ---------------------------------------------------------------------------
[images]
# Uploads are scaled down to fit inside max_width x max_height.
max_width = 1920
max_height = 1080

# Encoding quality is lowered step by step until the result fits this budget.
target_size_kb = 1024

# Files larger than this are rejected before any processing (10 MiB).
max_upload_bytes = 10485760

# ---------------------------------------------------------------------------
# Caches
# ---------------------------------------------------------------------------
[cache]
# Seconds a fetched profile is served from memory before refetching.
profile_ttl_secs = 60

# ---------------------------------------------------------------------------
# Notifications
# ---------------------------------------------------------------------------
[notifications]
# Auto-dismiss delay for success/error/warning toasts. Info toasts are sticky.
default_duration_ms = 5000
"##
}
