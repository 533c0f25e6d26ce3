use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection (and thus a transaction slot).
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Blob directory. Must not sit under any statically served directory.
    pub root: PathBuf,
    pub max_upload_bytes: u64,
    /// Budget for the metadata transaction of one upload.
    pub transaction_timeout_secs: u64,
    pub cache_max_age_secs: u64,
    /// Unreferenced blobs younger than this are left alone by the sweep.
    pub orphan_grace_secs: u64,
}

impl StorageConfig {
    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction_timeout_secs)
    }

    pub fn orphan_grace(&self) -> Duration {
        Duration::from_secs(self.orphan_grace_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("database.acquire_timeout_secs", 10)?
            .set_default("storage.root", "./storage/magazines")?
            .set_default("storage.max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("storage.transaction_timeout_secs", 15)?
            .set_default("storage.cache_max_age_secs", 3600)?
            .set_default("storage.orphan_grace_secs", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., MAGAZINE__STORAGE__ROOT)
            .add_source(Environment::with_prefix("MAGAZINE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
