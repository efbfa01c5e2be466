//! Configuration management

pub mod collections;

pub use collections::{CollectionConfig, CollectionRegistry, LabeledFields, ResultFormat};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search index connection and collection settings
    #[serde(default)]
    pub elasticsearch: ElasticsearchConfig,

    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LLMServiceConfig,

    /// Reasoning loop settings
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Elasticsearch connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Base URL of the cluster
    #[serde(default = "default_es_url")]
    pub url: String,

    #[serde(default = "default_es_username")]
    pub username: String,

    /// Basic auth is only sent when the password is non-empty
    #[serde(default = "default_es_password")]
    pub password: Option<String>,

    /// Collection searched when a tool call names none
    #[serde(default = "default_collection")]
    pub default_collection: String,

    /// Declarative per-collection search configuration (JSON)
    #[serde(default = "default_collections_file")]
    pub collections_file: PathBuf,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Verify TLS certificates when talking to the cluster
    #[serde(default = "default_verify_certs")]
    pub verify_certs: bool,
}

impl ElasticsearchConfig {
    /// Credentials to send, if any
    pub fn basic_auth(&self) -> Option<(&str, &str)> {
        match self.password.as_deref() {
            Some(password) if !password.is_empty() => Some((self.username.as_str(), password)),
            _ => None,
        }
    }
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: default_es_url(),
            username: default_es_username(),
            password: default_es_password(),
            default_collection: default_collection(),
            collections_file: default_collections_file(),
            timeout_secs: default_timeout(),
            verify_certs: default_verify_certs(),
        }
    }
}

fn default_es_url() -> String {
    std::env::var("QUARRY_ES_URL").unwrap_or_else(|_| "http://localhost:9200".to_string())
}

fn default_es_password() -> Option<String> {
    std::env::var("QUARRY_ES_PASSWORD").ok()
}

fn default_es_username() -> String {
    std::env::var("QUARRY_ES_USERNAME").unwrap_or_else(|_| "elastic".to_string())
}

fn default_collection() -> String {
    std::env::var("QUARRY_DEFAULT_COLLECTION").unwrap_or_else(|_| "documents".to_string())
}

fn default_collections_file() -> PathBuf {
    std::env::var("QUARRY_COLLECTIONS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/collections.json"))
}

fn default_timeout() -> u64 {
    std::env::var("QUARRY_ES_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30)
}

fn default_verify_certs() -> bool {
    std::env::var("QUARRY_ES_VERIFY_CERTS")
        .map(|v| v != "false" && v != "0")
        .unwrap_or(true)
}

/// LLM service configuration for an OpenAI-compatible endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMServiceConfig {
    /// Base URL of the chat completions service
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// Model name for chat completions
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// API key (optional, for authenticated services)
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LLMServiceConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_chat_model(),
            api_key: default_api_key(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_llm_url() -> String {
    std::env::var("QUARRY_LLM_URL").unwrap_or_else(|_| "https://api.openai.com".to_string())
}

fn default_api_key() -> Option<String> {
    std::env::var("QUARRY_LLM_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok()
}

fn default_chat_model() -> String {
    std::env::var("QUARRY_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string())
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_llm_timeout() -> u64 {
    60
}

/// Reasoning loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum think/act iterations in a single turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Lifetime of cached answers in seconds; 0 disables the cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl AgentConfig {
    pub fn cache_ttl(&self) -> Option<std::time::Duration> {
        (self.cache_ttl_secs > 0).then_some(std::time::Duration::from_secs(self.cache_ttl_secs))
    }
}

fn default_max_iterations() -> usize {
    std::env::var("QUARRY_MAX_ITERATIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(5)
}

fn default_cache_ttl() -> u64 {
    std::env::var("QUARRY_CACHE_TTL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(crate::agent::DEFAULT_CACHE_TTL.as_secs())
}

impl Config {
    /// Load config from `QUARRY_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path = std::env::var("QUARRY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self::load_from(&path)
    }

    /// Load config from a specific path, falling back to defaults when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.yml")).unwrap();
        assert!(config.agent.max_iterations > 0);
        assert!(config.elasticsearch.timeout_secs > 0);
    }

    #[test]
    fn test_load_yaml_overrides() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            r#"
elasticsearch:
  url: http://es.internal:9200
  default_collection: vehicle_issues
  collections_file: /etc/quarry/collections.json
llm_service:
  model: local-model
agent:
  max_iterations: 2
  cache_ttl_secs: 0
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.elasticsearch.url, "http://es.internal:9200");
        assert_eq!(config.elasticsearch.default_collection, "vehicle_issues");
        assert_eq!(
            config.elasticsearch.collections_file,
            PathBuf::from("/etc/quarry/collections.json")
        );
        assert_eq!(config.llm_service.model, "local-model");
        assert_eq!(config.agent.max_iterations, 2);
        assert!(config.agent.cache_ttl().is_none());
    }

    #[test]
    fn test_partial_sections_keep_secrets_from_env() {
        std::env::set_var("QUARRY_ES_PASSWORD", "es-secret-from-env");
        std::env::set_var("QUARRY_LLM_API_KEY", "sk-from-env");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "elasticsearch:\n  url: http://es.internal:9200\nllm_service:\n  model: local-model\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm_service.model, "local-model");
        assert_eq!(
            config.elasticsearch.password.as_deref(),
            Some("es-secret-from-env")
        );
        assert_eq!(config.llm_service.api_key.as_deref(), Some("sk-from-env"));

        // explicit values in the file still win
        std::fs::write(&path, "llm_service:\n  api_key: sk-from-file\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.llm_service.api_key.as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn test_basic_auth_requires_password() {
        let mut es = ElasticsearchConfig {
            password: None,
            ..Default::default()
        };
        assert!(es.basic_auth().is_none());

        es.password = Some(String::new());
        assert!(es.basic_auth().is_none());

        es.username = "elastic".to_string();
        es.password = Some("secret".to_string());
        assert_eq!(es.basic_auth(), Some(("elastic", "secret")));
    }
}
