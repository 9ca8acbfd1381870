//! Configuration and settings management
//!
//! Loads settings from environment variables and layered config files,
//! mirroring the environment contract of the legacy deployment
//! (`BIND_ADDRESS`, `PORT`, `HAS_SSL`, `NO_PORT`, `FQDN`, ...).

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// TMDB v3 API key
    pub tmdb_api_key: String,

    /// Language sent with TMDB requests
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port the HTTP server listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Truthy flag: the public URL uses https
    #[serde(rename = "has_ssl")]
    pub has_ssl_str: Option<String>,

    /// Truthy flag: the public URL omits the port
    #[serde(rename = "no_port")]
    pub no_port_str: Option<String>,

    /// Public hostname; falls back to `bind_address`
    pub fqdn: Option<String>,

    /// Timeout for outgoing TMDB requests, in seconds
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    /// Maximum number of cached responses
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,

    /// Path to the legacy Python deployment's requirements manifest;
    /// parsed and summarized at startup when set
    pub legacy_manifest_path: Option<String>,
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_http_timeout_secs() -> u64 {
    30
}

const fn default_cache_max_capacity() -> u64 {
    10_000
}

/// Truthy-string parsing used by the legacy deployment for flag variables
fn is_truthy(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "t" | "yes" | "y")
    )
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or `tmdb_api_key` is unset.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // Note: Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Whether the public URL is served over https
    #[must_use]
    pub fn has_ssl(&self) -> bool {
        is_truthy(self.has_ssl_str.as_deref())
    }

    /// Whether the public URL omits the port
    #[must_use]
    pub fn no_port(&self) -> bool {
        is_truthy(self.no_port_str.as_deref())
    }

    /// Public hostname, defaulting to the bind address
    #[must_use]
    pub fn fqdn(&self) -> &str {
        self.fqdn.as_deref().unwrap_or(&self.bind_address)
    }

    /// Public base URL, built the way the legacy deployment did:
    /// `http{s}://{fqdn}[:{port}]/`
    #[must_use]
    pub fn public_url(&self) -> String {
        format!(
            "http{}://{}{}/",
            if self.has_ssl() { "s" } else { "" },
            self.fqdn(),
            if self.no_port() {
                String::new()
            } else {
                format!(":{}", self.port)
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            tmdb_api_key: "dummy".to_string(),
            tmdb_language: default_tmdb_language(),
            bind_address: default_bind_address(),
            port: default_port(),
            has_ssl_str: None,
            no_port_str: None,
            fqdn: None,
            http_timeout_secs: default_http_timeout_secs(),
            cache_max_capacity: default_cache_max_capacity(),
            legacy_manifest_path: None,
        }
    }

    #[test]
    fn test_truthy_parsing() {
        for v in ["1", "true", "T", "Yes", "y", "TRUE"] {
            assert!(is_truthy(Some(v)), "{v} should be truthy");
        }
        for v in ["0", "false", "no", "", "on"] {
            assert!(!is_truthy(Some(v)), "{v} should be falsy");
        }
        assert!(!is_truthy(None));
    }

    #[test]
    fn test_public_url_default() {
        let settings = base_settings();
        assert_eq!(settings.public_url(), "http://0.0.0.0:8080/");
    }

    #[test]
    fn test_public_url_ssl_no_port() {
        let mut settings = base_settings();
        settings.has_ssl_str = Some("true".to_string());
        settings.no_port_str = Some("1".to_string());
        settings.fqdn = Some("films.example.org".to_string());
        assert_eq!(settings.public_url(), "https://films.example.org/");
    }

    #[test]
    fn test_fqdn_falls_back_to_bind_address() {
        let mut settings = base_settings();
        settings.bind_address = "127.0.0.1".to_string();
        assert_eq!(settings.fqdn(), "127.0.0.1");
    }

    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        std::env::set_var("TMDB_API_KEY", "key-from-env");
        std::env::set_var("FQDN", "gateway.example.org");

        let settings = Settings::new()?;
        assert_eq!(settings.tmdb_api_key, "key-from-env");
        assert_eq!(settings.fqdn.as_deref(), Some("gateway.example.org"));
        assert_eq!(settings.port, 8080);

        std::env::remove_var("TMDB_API_KEY");
        std::env::remove_var("FQDN");
        Ok(())
    }
}
