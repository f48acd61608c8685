use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database URL (file is created on first start)
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Chat-completions endpoint consulted when the strict catalog match is empty
    #[serde(default = "default_suggestion_api_url")]
    pub suggestion_api_url: String,

    /// API key for the suggestion endpoint; when unset the cascade skips the
    /// external call entirely
    pub suggestion_api_key: Option<String>,

    /// Model name sent with every suggestion request
    #[serde(default = "default_suggestion_model")]
    pub suggestion_model: String,

    /// Upper bound on a single suggestion call; the fallback cascade never
    /// waits longer than this
    #[serde(default = "default_suggestion_timeout_secs")]
    pub suggestion_timeout_secs: u64,

    /// Idle lifetime of a dialog session before it is expired
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_url() -> String {
    "sqlite://cinerec.db".to_string()
}

fn default_suggestion_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}

fn default_suggestion_model() -> String {
    "deepseek-chat".to_string()
}

fn default_suggestion_timeout_secs() -> u64 {
    10
}

fn default_session_ttl_secs() -> u64 {
    1800
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn suggestion_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.suggestion_timeout_secs)
    }

    pub fn session_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.session_ttl_secs)
    }
}
