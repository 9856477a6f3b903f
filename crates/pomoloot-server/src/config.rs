//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use pomoloot_shared::constants::{
    DATA_DRAGON_BASE_URL, DEFAULT_HTTP_PORT, DEFAULT_SESSION_TTL_HOURS,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8085`
    pub http_addr: SocketAddr,

    /// SQLite database file.
    /// Env: `DATABASE_PATH`
    /// Default: none (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Bearer token guarding `/api/catalog/refresh`.
    /// Env: `ADMIN_TOKEN`
    /// Default: empty (refresh endpoint disabled).
    pub admin_token: Option<String>,

    /// Lifetime of a login session.
    /// Env: `SESSION_TTL_HOURS`
    /// Default: `168`
    pub session_ttl_hours: i64,

    /// Fetch the Data Dragon catalog at startup and periodically.
    /// Env: `CATALOG_FETCH` (true/false)
    /// Default: `true`
    pub catalog_fetch: bool,

    /// Seconds between background catalog refreshes (0 = never).
    /// Env: `CATALOG_REFRESH_SECS`
    /// Default: `21600`
    pub catalog_refresh_secs: u64,

    /// Data Dragon root URL.
    /// Env: `DATA_DRAGON_URL`
    pub data_dragon_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: None,
            admin_token: None,
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            catalog_fetch: true,
            catalog_refresh_secs: 6 * 60 * 60,
            data_dragon_url: DATA_DRAGON_BASE_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH") {
            if !path.is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        if let Some(token) = lookup("ADMIN_TOKEN") {
            if !token.is_empty() {
                config.admin_token = Some(token);
            }
        }

        if let Some(val) = lookup("SESSION_TTL_HOURS") {
            match val.parse::<i64>() {
                Ok(hours) if hours > 0 => config.session_ttl_hours = hours,
                _ => tracing::warn!(value = %val, "Invalid SESSION_TTL_HOURS, using default"),
            }
        }

        if let Some(val) = lookup("CATALOG_FETCH") {
            config.catalog_fetch = val != "false" && val != "0";
        }

        if let Some(val) = lookup("CATALOG_REFRESH_SECS") {
            if let Ok(secs) = val.parse::<u64>() {
                config.catalog_refresh_secs = secs;
            } else {
                tracing::warn!(value = %val, "Invalid CATALOG_REFRESH_SECS, using default");
            }
        }

        if let Some(url) = lookup("DATA_DRAGON_URL") {
            let url = url.trim_end_matches('/');
            if !url.is_empty() {
                config.data_dragon_url = url.to_string();
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8085).into());
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.catalog_refresh_secs, 21600);
        assert!(config.catalog_fetch);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "127.0.0.1:9000"),
            ("DATABASE_PATH", "/tmp/pomoloot.db"),
            ("ADMIN_TOKEN", "secret"),
            ("SESSION_TTL_HOURS", "24"),
            ("CATALOG_FETCH", "false"),
            ("CATALOG_REFRESH_SECS", "0"),
            ("DATA_DRAGON_URL", "http://localhost:9999/"),
        ]);

        assert_eq!(config.http_addr, ([127, 0, 0, 1], 9000).into());
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/pomoloot.db")));
        assert_eq!(config.admin_token.as_deref(), Some("secret"));
        assert_eq!(config.session_ttl_hours, 24);
        assert!(!config.catalog_fetch);
        assert_eq!(config.catalog_refresh_secs, 0);
        assert_eq!(config.data_dragon_url, "http://localhost:9999");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("HTTP_ADDR", "not-an-addr"),
            ("SESSION_TTL_HOURS", "-3"),
            ("CATALOG_REFRESH_SECS", "soon"),
            ("ADMIN_TOKEN", ""),
        ]);

        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8085).into());
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.catalog_refresh_secs, 21600);
        assert!(config.admin_token.is_none());
    }
}
