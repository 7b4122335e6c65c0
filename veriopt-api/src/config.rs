//! Backend configuration
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file). Database credentials, the worker secret and LLM access are all
//! external concerns; missing values fall back to local-development defaults.

use std::time::Duration;

/// Origins of the local front-end dev servers
const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://127.0.0.1:5173",
    "http://localhost:5173",
    "http://127.0.0.1:8080",
    "http://localhost:8080",
];

/// Backend configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Postgres connection string; `None` selects the in-memory store
    pub database_url: Option<String>,

    /// Shared secret workers present as `Authorization: Bearer <token>`
    pub worker_token: String,

    /// Browser origins allowed by CORS
    pub allowed_origins: Vec<String>,

    pub llm: LlmConfig,
}

/// Settings for the OpenAI-compatible chat completions upstream
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Base URL up to and including the API version (e.g. `.../v1`)
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    /// Answer with canned replies instead of calling the upstream
    pub mock: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            api_key: "no-key".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.3".to_string(),
            timeout: Duration::from_secs(120),
            mock: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            database_url: None,
            worker_token: "local-worker-secret".to_string(),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            llm: LlmConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Creates configuration from environment variables
    ///
    /// Recognized variables:
    /// - DATABASE_URL (optional; in-memory store when unset)
    /// - VERIOPT_BIND_ADDR (default: 0.0.0.0:8000)
    /// - WORKER_TOKEN (default: local-worker-secret)
    /// - ALLOWED_ORIGINS (comma separated)
    /// - LLM_BASE_URL, LLM_API_KEY, LLM_MODEL, LLM_TIMEOUT_SECS
    /// - MOCK_ORCH=1 to answer LLM calls with canned replies
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let llm = LlmConfig {
            base_url: env_or("LLM_BASE_URL", defaults.llm.base_url)
                .trim_end_matches('/')
                .to_string(),
            api_key: env_or("LLM_API_KEY", defaults.llm.api_key),
            model: env_or("LLM_MODEL", defaults.llm.model),
            timeout: std::env::var("LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm.timeout),
            mock: std::env::var("MOCK_ORCH").is_ok_and(|v| v == "1"),
        };

        Self {
            bind_addr: env_or("VERIOPT_BIND_ADDR", defaults.bind_addr),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            worker_token: env_or("WORKER_TOKEN", defaults.worker_token),
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or(defaults.allowed_origins),
            llm,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_token.trim().is_empty() {
            anyhow::bail!("worker_token cannot be empty");
        }

        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if !self.llm.mock
            && !self.llm.base_url.starts_with("http://")
            && !self.llm.base_url.starts_with("https://")
        {
            anyhow::bail!("llm base_url must start with http:// or https://");
        }

        if self.llm.timeout.as_secs() == 0 {
            anyhow::bail!("llm timeout must be greater than 0");
        }

        Ok(())
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Split a comma separated origin list, dropping blanks
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_addr, "0.0.0.0:8000");
        assert!(config.database_url.is_none());
        assert_eq!(config.allowed_origins.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ApiConfig::default();

        config.worker_token = "  ".to_string();
        assert!(config.validate().is_err());
        config.worker_token = "secret".to_string();

        config.llm.base_url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        // Mock mode never calls the upstream
        config.llm.mock = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins("http://a.test, ,http://b.test "),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_origins("").is_empty());
    }
}
