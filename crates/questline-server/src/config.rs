//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "QUESTLINE_CONFIG";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "QUESTLINE_DATA_DIR";

/// Environment switch that enables demo seeding regardless of the config.
pub const DEMO_SEED_ENV: &str = "ALLOW_DEMO_SEED";

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Token settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Outgoing mail settings.
    #[serde(default)]
    pub mail: MailConfig,
    /// Leaderboard snapshot settings.
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// HTTP configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty = any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = `$QUESTLINE_DATA_DIR` or `./data`.
    #[serde(default)]
    pub data_dir: String,
}

/// Token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. Empty = random per process.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_minutes")]
    pub access_token_minutes: u64,
    #[serde(default = "default_refresh_days")]
    pub refresh_token_days: u64,
    /// Blacklist the presented refresh token and issue a new one on refresh.
    #[serde(default = "default_true")]
    pub rotate_refresh_tokens: bool,
    /// Lifetime of verification and password reset links.
    #[serde(default = "default_email_token_hours")]
    pub email_token_hours: u64,
}

/// Mail configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Prefix for links placed in mails. Empty = relative links.
    #[serde(default)]
    pub frontend_base_url: String,
}

/// Leaderboard configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Seconds between snapshot runs. 0 disables the snapshot task.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_secs: u64,
    /// Rows kept per snapshot and returned per query.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Load the demo track and admin account at startup.
    #[serde(default)]
    pub seed_demo_content: bool,
}

// Default value functions

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

fn default_access_minutes() -> u64 {
    60
}

fn default_refresh_days() -> u64 {
    1
}

fn default_email_token_hours() -> u64 {
    72
}

fn default_from_address() -> String {
    "noreply@questline.local".to_string()
}

fn default_snapshot_interval() -> u64 {
    3600
}

fn default_max_entries() -> usize {
    200
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_minutes: default_access_minutes(),
            refresh_token_days: default_refresh_days(),
            rotate_refresh_tokens: true,
            email_token_hours: default_email_token_hours(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            from_address: default_from_address(),
            frontend_base_url: String::new(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            snapshot_interval_secs: default_snapshot_interval(),
            max_entries: default_max_entries(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            seed_demo_content: false,
        }
    }
}

impl AuthConfig {
    pub fn access_ttl_secs(&self) -> u64 {
        self.access_token_minutes * 60
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_token_days * 24 * 60 * 60
    }

    pub fn email_token_ttl_secs(&self) -> u64 {
        self.email_token_hours * 60 * 60
    }
}

impl ServerConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir().join("questline.db")
    }

    /// `bind_addr:port` for the listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.http.bind_addr, self.http.port)
    }

    /// Whether demo content should be loaded, from the config or the env switch.
    pub fn demo_seed_enabled(&self) -> bool {
        self.advanced.seed_demo_content
            || std::env::var(DEMO_SEED_ENV)
                .map(|v| env_flag(&v))
                .unwrap_or(false)
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        // Explicit file wins over the data directory
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        Self::default_data_dir().join("questline.toml")
    }

    fn default_data_dir() -> PathBuf {
        std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"))
    }
}

/// Truthy values accepted by boolean environment switches.
pub fn env_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.http.bind_addr, "0.0.0.0");
        assert!(config.auth.jwt_secret.is_empty());
        assert_eq!(config.auth.access_token_minutes, 60);
        assert!(config.auth.rotate_refresh_tokens);
        assert!(config.mail.enabled);
        assert_eq!(config.leaderboard.snapshot_interval_secs, 3600);
        assert_eq!(config.leaderboard.max_entries, 200);
        assert!(!config.advanced.seed_demo_content);
    }

    #[test]
    fn test_config_serialization() {
        let config = ServerConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: ServerConfig = toml::from_str(&toml_str).expect("parse");
    }

    #[test]
    fn test_partial_file() {
        let config = ServerConfig::from_toml(
            r#"
            [http]
            port = 9000

            [leaderboard]
            snapshot_interval_secs = 0
            "#,
        )
        .expect("parse");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.bind_addr, "0.0.0.0");
        assert_eq!(config.leaderboard.snapshot_interval_secs, 0);
        assert_eq!(config.leaderboard.max_entries, 200);
        assert_eq!(config.advanced.log_level, "info");
    }

    #[test]
    fn test_ttls() {
        let auth = AuthConfig::default();
        assert_eq!(auth.access_ttl_secs(), 3600);
        assert_eq!(auth.refresh_ttl_secs(), 86_400);
        assert_eq!(auth.email_token_ttl_secs(), 72 * 3600);
    }

    #[test]
    fn test_explicit_data_dir() {
        let mut config = ServerConfig::default();
        config.storage.data_dir = "/srv/questline".into();
        assert_eq!(config.db_path(), PathBuf::from("/srv/questline/questline.db"));
    }

    #[test]
    fn test_env_flag() {
        for raw in ["1", "true", "YES", " on "] {
            assert!(env_flag(raw), "{raw}");
        }
        for raw in ["", "0", "false", "off", "maybe"] {
            assert!(!env_flag(raw), "{raw}");
        }
    }
}
