use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::mongodb::MongoConfig;
use std::env;
use std::str::FromStr;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Which repository backs the catalog
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    /// Process-local store; data is lost on restart
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreKind::Mongo),
            "memory" => Ok(StoreKind::Memory),
            other => Err(ConfigError::InvalidValue {
                key: "CATALOG_STORE".to_string(),
                details: format!("expected 'mongo' or 'memory', got '{other}'"),
            }),
        }
    }
}

/// Application configuration composed from the shared config pieces
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub store: StoreKind,
    /// Present only when `store` is [`StoreKind::Mongo`]
    pub mongo: Option<MongoConfig>,
    /// Comma-separated origins; unset allows any origin
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let store: StoreKind = env_or_default("CATALOG_STORE", "mongo").parse()?;
        let mongo = match store {
            StoreKind::Mongo => Some(MongoConfig::from_env()?), // Required for the mongo store
            StoreKind::Memory => None,
        };
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            store,
            mongo,
            cors_allowed_origin,
        })
    }
}
