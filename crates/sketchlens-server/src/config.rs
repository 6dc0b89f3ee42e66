//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3030";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_MAX_TOKENS: u32 = 800;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_MAX_SESSIONS: usize = 256;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to listen on.
    pub listen_addr: SocketAddr,
    /// Vision analysis is disabled without a key.
    pub openai_api_key: Option<String>,
    /// Chat-completions endpoint.
    pub openai_url: String,
    pub model: String,
    pub max_tokens: u32,
    /// Bound on every outgoing request.
    pub request_timeout: Duration,
    /// Read analyses aloud when requested.
    pub speech_enabled: bool,
    /// Sessions idle for longer are dropped.
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3030)),
            openai_api_key: None,
            openai_url: DEFAULT_OPENAI_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            speech_enabled: false,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    /// Read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from `lookup`, falling back to defaults for
    /// unset or blank variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(addr) = get("SKETCHLENS_ADDR") {
            config.listen_addr = addr
                .parse()
                .map_err(|e| ConfigError::invalid("SKETCHLENS_ADDR", &addr, e))?;
        }
        config.openai_api_key = get("OPENAI_API_KEY");
        if let Some(url) = get("SKETCHLENS_OPENAI_URL") {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::invalid(
                    "SKETCHLENS_OPENAI_URL",
                    &url,
                    "expected an http(s) URL",
                ));
            }
            config.openai_url = url;
        }
        if let Some(model) = get("SKETCHLENS_MODEL") {
            config.model = model;
        }
        if let Some(tokens) = get("SKETCHLENS_MAX_TOKENS") {
            config.max_tokens = match tokens.parse::<u32>() {
                Ok(0) => return Err(ConfigError::invalid("SKETCHLENS_MAX_TOKENS", &tokens, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("SKETCHLENS_MAX_TOKENS", &tokens, e)),
            };
        }
        if let Some(secs) = get("SKETCHLENS_TIMEOUT_SECS") {
            let secs = match secs.parse::<u64>() {
                Ok(0) => return Err(ConfigError::invalid("SKETCHLENS_TIMEOUT_SECS", &secs, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("SKETCHLENS_TIMEOUT_SECS", &secs, e)),
            };
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = get("SKETCHLENS_SESSION_TTL_SECS") {
            let secs = match secs.parse::<u64>() {
                Ok(0) => return Err(ConfigError::invalid("SKETCHLENS_SESSION_TTL_SECS", &secs, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("SKETCHLENS_SESSION_TTL_SECS", &secs, e)),
            };
            config.session_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = get("SKETCHLENS_MAX_SESSIONS") {
            config.max_sessions = match max.parse::<usize>() {
                Ok(0) => return Err(ConfigError::invalid("SKETCHLENS_MAX_SESSIONS", &max, "must be positive")),
                Ok(n) => n,
                Err(e) => return Err(ConfigError::invalid("SKETCHLENS_MAX_SESSIONS", &max, e)),
            };
        }
        if let Some(flag) = get("SKETCHLENS_TTS") {
            config.speech_enabled = parse_flag(&flag)
                .ok_or_else(|| ConfigError::invalid("SKETCHLENS_TTS", &flag, "expected a boolean"))?;
        }

        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 800);
        assert!(config.openai_api_key.is_none());
        assert!(!config.speech_enabled);
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.max_sessions, 256);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SKETCHLENS_ADDR", "127.0.0.1:8080"),
            ("OPENAI_API_KEY", " sk-test "),
            ("SKETCHLENS_OPENAI_URL", "http://localhost:9000/v1/chat/completions"),
            ("SKETCHLENS_MODEL", "gpt-4o"),
            ("SKETCHLENS_MAX_TOKENS", "1200"),
            ("SKETCHLENS_TIMEOUT_SECS", "5"),
            ("SKETCHLENS_TTS", "true"),
            ("SKETCHLENS_SESSION_TTL_SECS", "600"),
            ("SKETCHLENS_MAX_SESSIONS", "16"),
        ]))
        .unwrap();
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_url, "http://localhost:9000/v1/chat/completions");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_tokens, 1200);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.speech_enabled);
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        assert_eq!(config.max_sessions, 16);
    }

    #[test]
    fn test_blank_key_disables_analysis() {
        let config = ServerConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "   ")])).unwrap();
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("SKETCHLENS_ADDR", "not-an-addr"),
            ("SKETCHLENS_OPENAI_URL", "ftp://example.com"),
            ("SKETCHLENS_MAX_TOKENS", "0"),
            ("SKETCHLENS_MAX_TOKENS", "many"),
            ("SKETCHLENS_TIMEOUT_SECS", "-1"),
            ("SKETCHLENS_TTS", "maybe"),
            ("SKETCHLENS_SESSION_TTL_SECS", "0"),
            ("SKETCHLENS_MAX_SESSIONS", "lots"),
        ] {
            let result = ServerConfig::from_lookup(lookup(&[(key, value)]));
            assert!(
                matches!(&result, Err(ConfigError::Invalid { key: k, .. }) if *k == key),
                "{key}={value}"
            );
        }
    }
}
