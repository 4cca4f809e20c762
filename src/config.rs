use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Which durable storage backend persists the watchlist and preferences
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per key under `data_dir`
    File,
    /// Process-local only; nothing survives a restart
    Memory,
    /// Plain string keys in Redis
    Redis,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OMDb API key
    pub omdb_api_key: String,

    /// OMDb API base URL
    #[serde(default = "default_omdb_api_url")]
    pub omdb_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Quiet period before a typed query is searched, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Maximum number of search results returned per query
    #[serde(default = "default_search_result_limit")]
    pub search_result_limit: usize,

    /// Seconds a search session may go unused before it is closed
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,

    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    /// Directory used by the file storage backend
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Redis connection URL, only read when `storage_backend` is `redis`
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

fn default_omdb_api_url() -> String {
    "https://www.omdbapi.com/".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_search_result_limit() -> usize {
    12
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
