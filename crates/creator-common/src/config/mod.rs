//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment, MessagingConfig,
    RealtimeConfig, RedisConfig, SnowflakeConfig, StorageConfig,
};
