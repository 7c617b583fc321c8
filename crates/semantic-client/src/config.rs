use seekmark_core::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/api/semantic-match";

/// Connection settings for the semantic match service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 10_000,
            user_agent: format!("seekmark/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reads `SEEKMARK_SEMANTIC_URL`, `SEEKMARK_SEMANTIC_TIMEOUT_MS` and
    /// `SEEKMARK_SEMANTIC_USER_AGENT` over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("SEEKMARK_SEMANTIC_URL") {
            let url = url.trim();
            if !is_http_url(url) {
                return Err(ConfigError::InvalidValue("SEEKMARK_SEMANTIC_URL".to_string()));
            }
            config.endpoint = url.to_string();
        }
        if let Ok(value) = std::env::var("SEEKMARK_SEMANTIC_TIMEOUT_MS") {
            config.timeout_ms = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("SEEKMARK_SEMANTIC_TIMEOUT_MS".to_string()))?;
        }
        if let Ok(agent) = std::env::var("SEEKMARK_SEMANTIC_USER_AGENT") {
            config.user_agent = agent;
        }

        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if !is_http_url(&config.endpoint) {
            return Err(ConfigError::InvalidValue("endpoint".to_string()));
        }
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path.as_ref(), contents)?;
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::tempdir;

    const ENV_KEYS: [&str; 3] = [
        "SEEKMARK_SEMANTIC_URL",
        "SEEKMARK_SEMANTIC_TIMEOUT_MS",
        "SEEKMARK_SEMANTIC_USER_AGENT",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_builders() {
        let config = ClientConfig::default()
            .with_endpoint("https://search.example.com/match")
            .with_timeout(Duration::from_secs(3));
        assert_eq!(config.endpoint, "https://search.example.com/match");
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert!(config.user_agent.starts_with("seekmark/"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var("SEEKMARK_SEMANTIC_URL", "https://search.example.com/match");
        env::set_var("SEEKMARK_SEMANTIC_TIMEOUT_MS", "2500");

        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "https://search.example.com/match");
        assert_eq!(config.timeout_ms, 2500);

        env::set_var("SEEKMARK_SEMANTIC_TIMEOUT_MS", "soon");
        assert!(ClientConfig::from_env().is_err());

        env::set_var("SEEKMARK_SEMANTIC_TIMEOUT_MS", "100");
        env::set_var("SEEKMARK_SEMANTIC_URL", "ftp://search.example.com");
        assert!(ClientConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_from_toml_fills_defaults() {
        let config = ClientConfig::from_toml("endpoint = \"https://search.example.com/match\"\n").unwrap();
        assert_eq!(config.endpoint, "https://search.example.com/match");
        assert_eq!(config.timeout_ms, 10_000);

        assert!(matches!(
            ClientConfig::from_toml("endpoint = \"search.example.com\""),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(ClientConfig::from_toml("timeout_ms = \"soon\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("semantic.toml");

        let config = ClientConfig::default()
            .with_endpoint("https://search.example.com/match")
            .with_timeout(Duration::from_millis(1500));
        config.save_to_file(&path).unwrap();
        assert_eq!(ClientConfig::from_file(&path).unwrap(), config);

        assert!(matches!(
            ClientConfig::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io(_))
        ));
    }
}
