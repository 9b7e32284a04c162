use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment: development, staging or production.
    /// Controls the Secure flag on the identity cookie and CORS origins.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

/// Argon2 cost factors for password hashing. The defaults match the
/// argon2 crate's recommended parameters (19 MiB, 2 iterations).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_hash_memory_kib")]
    pub hash_memory_kib: u32,
    #[serde(default = "default_hash_iterations")]
    pub hash_iterations: u32,
    #[serde(default = "default_hash_parallelism")]
    pub hash_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            hash_memory_kib: default_hash_memory_kib(),
            hash_iterations: default_hash_iterations(),
            hash_parallelism: default_hash_parallelism(),
        }
    }
}

fn default_hash_memory_kib() -> u32 {
    19456
}

fn default_hash_iterations() -> u32 {
    2
}

fn default_hash_parallelism() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| "Failed to parse configuration file")?;
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.environment, "development");
        assert!(config.server.is_development());
        assert_eq!(config.auth.hash_iterations, 2);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8081
            environment = "production"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8081);
        assert!(!config.server.is_development());
        // Unspecified sections fall back to defaults
        assert_eq!(config.auth.hash_memory_kib, 19456);
    }
}
