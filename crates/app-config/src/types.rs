// In crates/app-config/src/types.rs

use serde::Deserialize;
use signals::RsiSettings;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Settings for the database connection.
    pub database: DatabaseSettings,
    /// Settings for the upstream market-data provider.
    pub market_data: MarketDataSettings,
    /// Parameters of the signal calculator.
    #[serde(default)]
    pub signals: RsiSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    /// The SQLite connection URL (e.g., "sqlite://data/signals.db").
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct MarketDataSettings {
    /// The base URL of the Yahoo Finance chart API.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Helper functions for serde defaults
fn default_log_level() -> String { "info".into() }
fn default_max_connections() -> u32 { 5 }
fn default_timeout_secs() -> u64 { 30 }
fn default_user_agent() -> String { "Mozilla/5.0 (X11; Linux x86_64)".into() }
