//! Configuration management for DisasterConnect
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/disasterconnect/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{ConnectError, Result};

/// Main configuration for DisasterConnect
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chat completion and embedding provider
    pub openai: OpenAIConfig,
    /// Vector index used by the retrieval step
    pub pinecone: PineconeConfig,
    /// Email delivery
    pub sendgrid: SendGridConfig,
    /// Public data sources behind the lookup tools
    pub tools: ToolsConfig,
    /// HTTP front end
    pub server: ServerConfig,
    /// Conversation loop behavior
    pub agent: AgentConfig,
    /// Resource files folded into the base prompt
    pub resources: ResourceConfig,
}

/// Completion/embedding API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// Base URL without the `/v1` suffix
    pub base_url: String,
    /// Secret; read from the file or environment, never written out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Chat model (default: gpt-4o-mini)
    pub model: String,
    /// Embedding model for retrieval (default: text-embedding-3-small)
    pub embedding_model: String,
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Pinecone index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// Whether each turn runs the retrieval step
    pub enabled: bool,
    /// Secret; read from the file or environment, never written out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Data-plane host of the index, e.g. https://cstugpt-dc-xxxx.svc.pinecone.io
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_host: Option<String>,
    /// Partition holding the relief corpus
    pub namespace: String,
    /// Matches fetched per query
    pub top_k: usize,
    /// Characters per chunk when ingesting
    pub chunk_size: usize,
    /// Control-plane API used to create and describe indexes
    pub control_url: String,
    /// Index created on first ingest when missing
    pub index_name: String,
    /// Vector width of the embedding model
    pub dimension: usize,
    pub metric: String,
    /// Serverless placement of a newly created index
    pub cloud: String,
    pub region: String,
    /// Delay between readiness checks after creating an index
    pub ready_poll_ms: u64,
    /// Give up waiting for readiness after this long
    pub ready_timeout_secs: u64,
}

/// SendGrid configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendGridConfig {
    pub base_url: String,
    /// Secret; read from the file or environment, never written out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Verified sender address
    pub sender: String,
}

/// Endpoints of the public data tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Open-Meteo forecast API
    pub weather_url: String,
    /// Shelter search API
    pub shelter_url: String,
    /// AirNow API
    pub airnow_url: String,
    /// Secret; read from the file or environment, never written out
    #[serde(skip_serializing)]
    pub airnow_api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under /images
    pub images_dir: PathBuf,
    /// Directory served under /css
    pub css_dir: PathBuf,
    /// Sessions idle this long are dropped (default: 3600)
    pub session_ttl_secs: u64,
    /// Live sessions kept before the least recently used is dropped
    pub max_sessions: usize,
}

/// Conversation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Attempts before a completion call gives up (default: 3)
    pub retry_attempts: u32,
    /// Backoff multiplier in milliseconds (default: 1000)
    pub retry_multiplier_ms: u64,
    /// Upper bound on a single backoff wait in milliseconds (default: 40000)
    pub retry_max_wait_ms: u64,
    /// Whether to show debug output
    pub debug: bool,
}

/// Files concatenated verbatim into the base prompt at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub files: Vec<PathBuf>,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com"),
            api_key: env::var("OPENAI_API_KEY").ok(),
            model: env_or("DC_MODEL", "gpt-4o-mini"),
            embedding_model: env_or("DC_EMBEDDING_MODEL", "text-embedding-3-small"),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl Default for PineconeConfig {
    fn default() -> Self {
        let index_host = env::var("PINECONE_INDEX_HOST").ok();
        Self {
            // Retrieval only makes sense once an index is known
            enabled: env_flag("DC_RETRIEVAL", index_host.is_some()),
            api_key: env::var("PINECONE_API_KEY").ok(),
            index_host,
            namespace: env_or("PINECONE_NAMESPACE", "dc"),
            top_k: 3,
            chunk_size: 500,
            control_url: env_or("PINECONE_CONTROL_URL", "https://api.pinecone.io"),
            index_name: env_or("PINECONE_INDEX_NAME", "cstugpt-dc"),
            dimension: 1536,
            metric: "cosine".to_string(),
            cloud: "aws".to_string(),
            region: "us-east-1".to_string(),
            ready_poll_ms: 1_000,
            ready_timeout_secs: 300,
        }
    }
}

impl Default for SendGridConfig {
    fn default() -> Self {
        Self {
            base_url: env_or("SENDGRID_BASE_URL", "https://api.sendgrid.com"),
            api_key: env::var("SENDGRID_API_KEY").ok(),
            sender: env_or("DC_EMAIL_SENDER", "noreply@disasterconnect.org"),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            weather_url: env_or("DC_WEATHER_URL", "https://api.open-meteo.com"),
            shelter_url: env_or("DC_SHELTER_URL", "https://api.redcross.org"),
            airnow_url: env_or("DC_AIRNOW_URL", "https://www.airnowapi.org"),
            airnow_api_key: env::var("AIRNOW_API_KEY").ok(),
            timeout_secs: 30,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env_or("DC_HOST", "127.0.0.1"),
            port: env::var("DC_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            images_dir: PathBuf::from("images"),
            css_dir: PathBuf::from("css"),
            session_ttl_secs: 3_600,
            max_sessions: 1_000,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_multiplier_ms: 1_000,
            retry_max_wait_ms: 40_000,
            debug: env_flag("DC_DEBUG", false),
        }
    }
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            files: [
                "data/additional_resources.txt",
                "data/user_type_resources/survivor.txt",
                "data/user_type_resources/provider.txt",
                "data/user_type_resources/concerned_public.txt",
                "data/user_type_resources/relief_organization.txt",
            ]
            .iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("disasterconnect")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(config) => config,
            Err(e) => {
                tracing::debug!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(ConnectError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| ConnectError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConnectError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| ConnectError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConnectError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| ConnectError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }

    /// Socket address the server binds to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Whether the retrieval step can run
    pub fn retrieval_ready(&self) -> bool {
        self.pinecone.enabled && self.pinecone.index_host.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pinecone.namespace, "dc");
        assert_eq!(config.pinecone.top_k, 3);
        assert_eq!(config.pinecone.chunk_size, 500);
        assert_eq!(config.pinecone.dimension, 1536);
        assert_eq!(config.pinecone.metric, "cosine");
        assert_eq!(config.agent.retry_attempts, 3);
        assert_eq!(config.agent.retry_max_wait_ms, 40_000);
        assert_eq!(config.resources.files.len(), 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [openai]
            model = "gpt-4o"

            [server]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.agent.retry_attempts, 3);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("[server\nport = ").unwrap_err();
        assert!(matches!(err, ConnectError::Config(_)));
    }

    #[test]
    fn test_config_serialization() {
        let toml_str = Config::default_config_toml();
        assert!(toml_str.contains("[openai]"));
        assert!(toml_str.contains("namespace"));
    }

    #[test]
    fn test_serialized_config_omits_api_keys() {
        let mut config = Config::default();
        config.openai.api_key = Some("sk-live-SECRET".to_string());
        config.pinecone.api_key = Some("pc-SECRET".to_string());
        config.sendgrid.api_key = Some("SG.SECRET".to_string());
        config.tools.airnow_api_key = Some("airnow-SECRET".to_string());

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(!toml_str.contains("SECRET"));
        assert!(!toml_str.contains("api_key"));
    }

    #[test]
    fn test_api_keys_still_read_from_file() {
        let config = Config::from_toml(
            r#"
            [openai]
            api_key = "sk-from-file"
            "#,
        )
        .unwrap();
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-from-file"));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("disasterconnect"));
    }
}
