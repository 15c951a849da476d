//! Server configuration module.
//!
//! Layered: built-in defaults, then an optional TOML file, then
//! `INVENTORY__`-prefixed environment variables (after `.env` is loaded).
//!
//! ```text
//! INVENTORY__SERVER__PORT=9090
//! INVENTORY__DATABASE__URL=sqlite:///var/lib/inventario/inventario.db
//! INVENTORY__AUTH__SEED_DEV_USERS=true
//! ```

use std::env;
use std::time::Duration;

use config::{Config, Environment, File};
use ferreteria_db::DbConfig;
use serde::{Deserialize, Serialize};

/// Names the TOML file to read; defaults to `inventory.toml`.
pub const CONFIG_FILE_ENV: &str = "INVENTORY_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "inventory.toml";

/// Inventory server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub server: HttpSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// The single endpoint path
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Only `sqlite` is supported
    pub driver: String,

    pub url: String,

    /// Ignored by SQLite
    pub user: Option<String>,

    /// Ignored by SQLite
    pub password: Option<String>,

    pub max_connections: u32,

    pub min_idle: u32,

    pub connect_timeout_ms: u64,

    pub idle_timeout_ms: u64,

    pub max_lifetime_ms: u64,

    /// Stock transactions held longer than this are logged
    pub leak_detection_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// Realm sent in `WWW-Authenticate`
    pub realm: String,

    /// Fall back to the built-in development users when the store has none
    pub seed_dev_users: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            server: HttpSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
                path: "/InventarioService".to_string(),
            },
            database: DatabaseSettings {
                driver: "sqlite".to_string(),
                url: "sqlite://inventario.db".to_string(),
                user: None,
                password: None,
                max_connections: 10,
                min_idle: 2,
                connect_timeout_ms: 30_000,
                idle_timeout_ms: 600_000,
                max_lifetime_ms: 1_800_000,
                leak_detection_threshold_ms: 60_000,
            },
            auth: AuthSettings {
                realm: "InventarioService".to_string(),
                seed_dev_users: false,
            },
            log: LogSettings {
                format: LogFormat::Pretty,
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from defaults, the optional file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let defaults = ServerConfig::default();

        let config = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.path", defaults.server.path)?
            .set_default("database.driver", defaults.database.driver)?
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("database.min_idle", i64::from(defaults.database.min_idle))?
            .set_default("database.connect_timeout_ms", defaults.database.connect_timeout_ms as i64)?
            .set_default("database.idle_timeout_ms", defaults.database.idle_timeout_ms as i64)?
            .set_default("database.max_lifetime_ms", defaults.database.max_lifetime_ms as i64)?
            .set_default(
                "database.leak_detection_threshold_ms",
                defaults.database.leak_detection_threshold_ms as i64,
            )?
            .set_default("auth.realm", defaults.auth.realm)?
            .set_default("auth.seed_dev_users", defaults.auth.seed_dev_users)?
            .set_default("log.format", "pretty")?
            .add_source(File::with_name(&file).required(false))
            .add_source(
                Environment::with_prefix("INVENTORY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: ServerConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.database.driver.eq_ignore_ascii_case("sqlite") {
            return Err(ConfigError::InvalidValue(format!(
                "database.driver: unsupported driver '{}'",
                self.database.driver
            )));
        }
        if !self.server.path.starts_with('/') {
            return Err(ConfigError::InvalidValue(
                "server.path must start with '/'".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.min_idle > self.database.max_connections {
            return Err(ConfigError::InvalidValue(
                "database.min_idle exceeds database.max_connections".to_string(),
            ));
        }
        if self.database.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "database.connect_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Store settings for [`ferreteria_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        let db = &self.database;
        DbConfig::new(db.url.clone())
            .max_connections(db.max_connections)
            .min_connections(db.min_idle)
            .connect_timeout(Duration::from_millis(db.connect_timeout_ms))
            .idle_timeout(Duration::from_millis(db.idle_timeout_ms))
            .max_lifetime(Duration::from_millis(db.max_lifetime_ms))
            .leak_detection_threshold(Duration::from_millis(db.leak_detection_threshold_ms))
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// True when credentials were configured that SQLite will not use.
    pub fn has_unused_db_credentials(&self) -> bool {
        self.database.user.is_some() || self.database.password.is_some()
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.has_unused_db_credentials());

        let db = config.db_config();
        assert_eq!(db.max_connections, 10);
        assert_eq!(db.min_connections, 2);
        assert_eq!(db.connect_timeout, Duration::from_secs(30));
        assert_eq!(db.leak_detection_threshold, Duration::from_secs(60));
    }

    #[test]
    fn test_rejects_other_drivers() {
        let mut config = ServerConfig::default();
        config.database.driver = "postgres".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_rejects_inverted_pool_bounds() {
        let mut config = ServerConfig::default();
        config.database.min_idle = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_relative_path() {
        let mut config = ServerConfig::default();
        config.server.path = "InventarioService".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_names() {
        let format: LogFormat = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(format, LogFormat::Compact);
    }
}
