// src/config/mod.rs
pub mod oracle;

pub use oracle::{
    ConfigError, DashboardConfig, DelayConfig, OracleConfig, RedditConfig, DEFAULT_CONFIG_PATH,
    ENV_CONFIG_PATH,
};
