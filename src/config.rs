use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Inbound messages are cut at this many bytes
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_request_bytes: default_max_request_bytes(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Directory every `path` argument is resolved beneath
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// `read_file` returns at most this many bytes (the rest is not read)
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
    #[serde(default = "default_max_list_depth")]
    pub max_list_depth: usize,
    /// `recursive_file_list` stops recording after this many paths
    #[serde(default = "default_max_list_entries")]
    pub max_list_entries: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_file_bytes: default_max_file_bytes(),
            max_list_depth: default_max_list_depth(),
            max_list_entries: default_max_list_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the bearer token
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Responses larger than this fail the call
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            default_max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_request_bytes() -> usize {
    8192
}

fn default_read_timeout_secs() -> u64 {
    30
}

fn default_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_max_file_bytes() -> usize {
    8191
}

fn default_max_list_depth() -> usize {
    32
}

fn default_max_list_entries() -> usize {
    10_000
}

fn default_endpoint() -> String {
    "https://api.x.ai/v1/chat/completions".to_string()
}

fn default_api_key_env() -> String {
    "XAI_API_KEY".to_string()
}

fn default_model() -> String {
    "grok-4".to_string()
}

fn default_max_tokens() -> u64 {
    512
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_response_bytes() -> usize {
    1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            sandbox: SandboxConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or ~/.sandbox-mcp/config.toml when none is given.
    /// Falls back to defaults if the file doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to `path`, or ~/.sandbox-mcp/config.toml
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(config_path)
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".sandbox-mcp").join("config.toml"))
    }
}
