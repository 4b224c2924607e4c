//! Application configuration

pub mod locale;
pub mod prompts;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use locale::{Guide, Locale};
pub use prompts::PersonaMap;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MAX_TOKENS: u32 = 500;
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub locale: Locale,
    pub prompts_dir: Option<PathBuf>,
    /// Idle seconds before a session is forgotten
    pub session_ttl_secs: u64,
    pub max_sessions: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.into(),
            openai_model: DEFAULT_MODEL.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            locale: Locale::default(),
            prompts_dir: None,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            max_sessions: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let locale = match lookup("FORTUNE_LOCALE") {
            Some(raw) => raw.parse::<Locale>().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to {:?}", e, defaults.locale);
                defaults.locale
            }),
            None => defaults.locale,
        };

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_base_url: lookup("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            openai_model: lookup("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            max_tokens: lookup("OPENAI_MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            timeout_secs: lookup("OPENAI_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_secs),
            locale,
            prompts_dir: lookup("FORTUNE_PROMPTS_DIR").map(PathBuf::from),
            session_ttl_secs: lookup("FORTUNE_SESSION_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.session_ttl_secs),
            max_sessions: lookup("FORTUNE_MAX_SESSIONS")
                .and_then(|v| v.parse().ok())
                .filter(|&n| n > 0),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// How often idle sessions are swept: the TTL, capped at a minute
    pub fn sweep_interval(&self) -> Duration {
        self.session_ttl()
            .min(MAX_SWEEP_INTERVAL)
            .max(Duration::from_secs(1))
    }

    /// The API credential, or `ConfigError::MissingCredential`
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API credential not configured")]
    MissingCredential,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.openai_model, "gpt-3.5-turbo");
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.locale, Locale::Ko);
        assert_eq!(config.api_key(), Err(ConfigError::MissingCredential));
        assert_eq!(config.session_ttl(), Duration::from_secs(1800));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert!(config.max_sessions.is_none());
    }

    #[test]
    fn test_session_limits() {
        let config = config_from(&[
            ("FORTUNE_SESSION_TTL_SECS", "5"),
            ("FORTUNE_MAX_SESSIONS", "100"),
        ]);
        assert_eq!(config.session_ttl(), Duration::from_secs(5));
        assert_eq!(config.sweep_interval(), Duration::from_secs(5));
        assert_eq!(config.max_sessions, Some(100));

        let config = config_from(&[("FORTUNE_MAX_SESSIONS", "0")]);
        assert!(config.max_sessions.is_none());
    }

    #[test]
    fn test_blank_key_is_missing() {
        let config = config_from(&[("OPENAI_API_KEY", "   ")]);
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("OPENAI_API_KEY", "sk-test"),
            ("FORTUNE_LOCALE", "en"),
            ("OPENAI_MAX_TOKENS", "not-a-number"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.api_key(), Ok("sk-test"));
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.max_tokens, 500);
    }
}
