use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("error parsing configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".into()
}

fn default_db_connection() -> String {
    "sqlite://room_party.sqlite?mode=rwc".into()
}

fn default_db_pool_size() -> u32 {
    10
}

fn default_publisher_key() -> String {
    String::new()
}

fn default_publisher_cluster() -> String {
    String::new()
}

fn default_publisher_secret() -> String {
    String::new()
}

fn default_auth_provider_appid() -> String {
    String::new()
}

fn default_auth_provider_secret() -> String {
    String::new()
}

fn default_auth_provider_url() -> String {
    String::new()
}

fn default_token_secret() -> String {
    String::new()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_stale_room_ttl_secs() -> u64 {
    3600
}

fn default_log_file_enabled() -> bool {
    true
}

fn default_log_directory() -> PathBuf {
    "logs".into()
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_filename() -> String {
    "room-party.log".into()
}

/// Process-wide configuration, read once at startup. Booted
/// from `config/app.toml`, created with these defaults on first run;
/// secrets may be overridden with `ROOMPARTY_`-prefixed environment
/// variables so they never need to sit in the file on disk.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_db_connection")]
    pub db_connection: String,
    #[serde(default = "default_db_pool_size")]
    pub db_pool_size: u32,

    #[serde(default = "default_publisher_key")]
    pub publisher_key: String,
    #[serde(default = "default_publisher_cluster")]
    pub publisher_cluster: String,
    #[serde(default = "default_publisher_secret")]
    pub publisher_secret: String,

    #[serde(default = "default_auth_provider_appid")]
    pub auth_provider_appid: String,
    #[serde(default = "default_auth_provider_secret")]
    pub auth_provider_secret: String,
    /// Endpoint the production `AuthProvider` exchanges a bearer token for a
    /// `userId` against. Empty disables outbound resolution (test builds
    /// inject a deterministic provider instead).
    #[serde(default = "default_auth_provider_url")]
    pub auth_provider_url: String,

    #[serde(default = "default_token_secret")]
    pub token_secret: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_stale_room_ttl_secs")]
    pub stale_room_ttl_secs: u64,

    #[serde(default = "default_log_file_enabled")]
    pub log_file_enabled: bool,
    #[serde(default = "default_log_directory")]
    pub log_directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_filename")]
    pub log_filename: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            db_connection: default_db_connection(),
            db_pool_size: default_db_pool_size(),
            publisher_key: default_publisher_key(),
            publisher_cluster: default_publisher_cluster(),
            publisher_secret: default_publisher_secret(),
            auth_provider_appid: default_auth_provider_appid(),
            auth_provider_secret: default_auth_provider_secret(),
            auth_provider_url: default_auth_provider_url(),
            token_secret: default_token_secret(),
            token_ttl_secs: default_token_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            stale_room_ttl_secs: default_stale_room_ttl_secs(),
            log_file_enabled: default_log_file_enabled(),
            log_directory: default_log_directory(),
            log_level: default_log_level(),
            log_filename: default_log_filename(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut root_dir = std::env::current_dir()?.join("config");
        env_replace_path("ROOMPARTY_CONFIG_DIR", &mut root_dir);

        if !root_dir.exists() {
            std::fs::create_dir_all(&root_dir)?;
        }

        Self::load_from(&root_dir.join("app.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            toml::from_str(&data)?
        } else {
            let config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&config).expect("config serialization failed"))?;
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        env_replace_string("ROOMPARTY_LISTEN_ADDR", &mut self.listen_addr);
        env_replace_string("ROOMPARTY_DB_CONNECTION", &mut self.db_connection);
        env_replace_string("ROOMPARTY_PUBLISHER_KEY", &mut self.publisher_key);
        env_replace_string("ROOMPARTY_PUBLISHER_CLUSTER", &mut self.publisher_cluster);
        env_replace_string("ROOMPARTY_PUBLISHER_SECRET", &mut self.publisher_secret);
        env_replace_string("ROOMPARTY_AUTH_PROVIDER_APPID", &mut self.auth_provider_appid);
        env_replace_string("ROOMPARTY_AUTH_PROVIDER_SECRET", &mut self.auth_provider_secret);
        env_replace_string("ROOMPARTY_AUTH_PROVIDER_URL", &mut self.auth_provider_url);
        env_replace_string("ROOMPARTY_TOKEN_SECRET", &mut self.token_secret);
    }
}

fn env_replace_string(key: &str, slot: &mut String) {
    if let Ok(value) = std::env::var(key) {
        *slot = value;
    }
}

fn env_replace_path(key: &str, slot: &mut PathBuf) {
    if let Ok(value) = std::env::var(key) {
        *slot = PathBuf::from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_toml() {
        let config = AppConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(config.listen_addr, deserialized.listen_addr);
        assert_eq!(config.db_pool_size, deserialized.db_pool_size);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig = toml::from_str("listen_addr = \"127.0.0.1:9000\"").unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.db_pool_size, default_db_pool_size());
    }
}
