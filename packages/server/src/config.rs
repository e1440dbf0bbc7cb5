use std::path::PathBuf;

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
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub sqlx_logging: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of issued tokens.
    pub token_ttl_hours: i64,
    /// Use the role embedded in the token instead of the one stored on the user row.
    pub trust_token_role: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// Maximum size of a single uploaded file, in bytes.
    pub max_file_size: u64,
}

/// Outbound payment gateway (Chapa-compatible).
#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub enabled: bool,
    pub base_url: String,
    pub secret_key: String,
    pub currency: String,
    pub callback_url: Option<String>,
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub uploads: UploadConfig,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 2)?
            .set_default("database.connect_timeout_secs", 8)?
            .set_default("database.sqlx_logging", false)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("auth.trust_token_role", false)?
            .set_default("uploads.dir", "./uploads")?
            .set_default("uploads.max_file_size", 10 * 1024 * 1024)?
            .set_default("payment.enabled", false)?
            .set_default("payment.base_url", "https://api.chapa.co/v1")?
            .set_default("payment.secret_key", "")?
            .set_default("payment.currency", "ETB")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., EVENTHUB__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("EVENTHUB").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
