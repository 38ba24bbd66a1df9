// src/config.rs - Configuration management for the routine synthesis service

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    pub index_path: String,
    pub metadata_path: String,
    /// If set, the server refuses to start rather than silently ignoring
    /// an ingest rebuild request it does not implement (§6, Non-goals §1).
    pub refresh_on_start: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub batch_size: usize,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("Configuration file not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path.display(), e))?;

        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let config_path = std::env::var("ROUTINE_SYNTH_CONFIG_PATH")
            .unwrap_or_else(|_| "config/default.toml".to_string());

        let mut config = Self::load_from_file(&config_path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("ROUTINE_SYNTH_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("ROUTINE_SYNTH_SERVER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(index_path) = std::env::var("ROUTINE_SYNTH_INDEX_PATH") {
            self.catalog.index_path = index_path;
        }
        if let Ok(metadata_path) = std::env::var("ROUTINE_SYNTH_METADATA_PATH") {
            self.catalog.metadata_path = metadata_path;
        }

        if let Ok(url) = std::env::var("ROUTINE_SYNTH_EMBEDDING_URL") {
            self.embedding.base_url = url;
        }
        if let Ok(key) = std::env::var("ROUTINE_SYNTH_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(key);
        }

        if let Ok(url) = std::env::var("ROUTINE_SYNTH_LLM_URL") {
            self.llm.base_url = url;
        }
        if let Ok(key) = std::env::var("ROUTINE_SYNTH_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }

        if let Ok(log_level) = std::env::var("ROUTINE_SYNTH_LOG_LEVEL") {
            self.logging.level = log_level;
        }
    }

    pub fn get_server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Validate configuration. §6's `refreshOnStart` is a recognized but
    /// unimplemented option (offline ingest is out of scope); turning it
    /// on is rejected here rather than silently ignored.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(anyhow!("Invalid server port: {}", self.server.port));
        }

        if self.embedding.base_url.is_empty() {
            return Err(anyhow!("embedding.base_url is empty"));
        }

        if self.llm.base_url.is_empty() {
            return Err(anyhow!("llm.base_url is empty"));
        }

        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(anyhow!(
                "llm.temperature out of range [0.0, 1.0]: {}",
                self.llm.temperature
            ));
        }

        if self.embedding.batch_size == 0 || self.embedding.batch_size > 256 {
            return Err(anyhow!(
                "embedding.batch_size out of range [1, 256]: {}",
                self.embedding.batch_size
            ));
        }

        if self.catalog.refresh_on_start {
            return Err(anyhow!(
                "catalog.refresh_on_start is set but offline ingest is out of scope for this service"
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
            catalog: CatalogConfig {
                index_path: "data/exercise_index.bin".to_string(),
                metadata_path: "data/exercise_metadata.json".to_string(),
                refresh_on_start: false,
            },
            embedding: EmbeddingConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "text-embedding-3-large".to_string(),
                batch_size: 16,
                timeout_seconds: 15,
                api_key: None,
            },
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o-mini".to_string(),
                temperature: 0.4,
                max_tokens: 4096,
                timeout_seconds: 30,
                api_key: None,
            },
            cache: CacheConfig {
                ttl_seconds: 300,
                max_entries: 512,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "text".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let serialized = toml::to_string(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(config.server.port, deserialized.server.port);
        assert_eq!(config.embedding.model, deserialized.embedding.model);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("test_config.toml");

        let config_content = r#"
[server]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://test.com"]

[catalog]
index_path = "data/test.bin"
metadata_path = "data/test.json"
refresh_on_start = false

[embedding]
base_url = "http://test-embeddings:9000"
model = "text-embedding-3-large"
batch_size = 8
timeout_seconds = 10

[llm]
base_url = "http://test-llm:9001"
model = "gpt-4o-mini"
temperature = 0.2
max_tokens = 2048
timeout_seconds = 20

[cache]
ttl_seconds = 60
max_entries = 100

[logging]
level = "debug"
format = "text"
        "#;

        fs::write(&config_path, config_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.embedding.base_url, "http://test-embeddings:9000");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_refresh_on_start_rejected() {
        let mut config = Config::default();
        config.catalog.refresh_on_start = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_temperature_rejected() {
        let mut config = Config::default();
        config.llm.temperature = 1.5;
        assert!(config.validate().is_err());
    }
}
