//! Configuration management for the voice relay

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::provider::RetryPolicy;
use crate::{Error, Result};

/// Default generation endpoint base
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 5000;

/// Voice relay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Generation provider configuration
    pub provider: ProviderConfig,

    /// Optional persona file overriding the embedded persona
    pub persona_path: Option<PathBuf>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Address to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,
}

/// Generation provider configuration
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider credential; `None` selects mock mode
    pub api_key: Option<SecretString>,

    /// Model identifier
    pub model: String,

    /// Endpoint base URL, the model and method are appended
    pub api_base: String,

    /// Outbound request timeout
    pub timeout: Duration,

    /// Retry policy for transient overload responses
    pub retry: RetryPolicy,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl ProviderConfig {
    /// Whether a credential is configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values are treated as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_server = ApiServerConfig {
            host: get("VOICE_RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            static_dir: get("VOICE_RELAY_STATIC_DIR").map(PathBuf::from),
        };

        let retry = RetryPolicy {
            delay: Duration::from_millis(parse_or(
                "VOICE_RELAY_RETRY_DELAY_MS",
                get("VOICE_RELAY_RETRY_DELAY_MS"),
                1000,
            )?),
            ..RetryPolicy::default()
        };

        let provider = ProviderConfig {
            api_key: get("GEMINI_API_KEY").map(SecretString::from),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            timeout: Duration::from_secs(parse_or(
                "GEMINI_TIMEOUT_SECS",
                get("GEMINI_TIMEOUT_SECS"),
                30,
            )?),
            retry,
        };

        if !provider.is_configured() {
            tracing::warn!("GEMINI_API_KEY not set, provider runs in mock mode");
        }

        Ok(Self {
            api_server,
            provider,
            persona_path: get("VOICE_RELAY_PERSONA").map(PathBuf::from),
        })
    }
}

/// Parse an optional value, falling back to a default when unset
fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| Error::Config(format!("invalid {key} '{raw}': {e}")))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api_server.port, DEFAULT_PORT);
        assert_eq!(config.api_server.host, "0.0.0.0");
        assert!(config.api_server.static_dir.is_none());
        assert!(!config.provider.is_configured());
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert_eq!(config.provider.api_base, DEFAULT_API_BASE);
        assert_eq!(config.provider.retry.delay, Duration::from_secs(1));
        assert_eq!(config.provider.retry.max_attempts, 2);
        assert!(config.persona_path.is_none());
    }

    #[test]
    fn reads_provider_settings() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_TIMEOUT_SECS", "5"),
            ("VOICE_RELAY_RETRY_DELAY_MS", "250"),
        ])
        .unwrap();

        let key = config.provider.api_key.as_ref().unwrap();
        assert_eq!(key.expose_secret(), "secret");
        assert_eq!(config.provider.model, "gemini-2.0-flash");
        assert_eq!(config.provider.timeout, Duration::from_secs(5));
        assert_eq!(config.provider.retry.delay, Duration::from_millis(250));
    }

    #[test]
    fn empty_key_means_mock_mode() {
        let config = config_from(&[("GEMINI_API_KEY", "  ")]).unwrap();
        assert!(!config.provider.is_configured());
    }

    #[test]
    fn reads_server_settings() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("VOICE_RELAY_HOST", "127.0.0.1"),
            ("VOICE_RELAY_STATIC_DIR", "/srv/www"),
            ("VOICE_RELAY_PERSONA", "/etc/persona.json"),
        ])
        .unwrap();

        assert_eq!(config.api_server.port, 8080);
        assert_eq!(config.api_server.host, "127.0.0.1");
        assert_eq!(config.api_server.static_dir, Some(PathBuf::from("/srv/www")));
        assert_eq!(config.persona_path, Some(PathBuf::from("/etc/persona.json")));
    }

    #[test]
    fn rejects_invalid_port() {
        let err = config_from(&[("PORT", "not-a-port")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = config_from(&[("GEMINI_API_KEY", "super-secret-value")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-value"));
    }
}
