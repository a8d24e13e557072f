use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub email: EmailConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_thirty")]
    pub connect_timeout_seconds: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_seconds: u64,
    #[serde(default = "default_thirty")]
    pub health_check_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    #[serde(default = "default_true")]
    pub use_tls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub base_uri: String,
    pub api_key: String,
    pub secret_key: String,
    #[serde(default = "default_thirty")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    #[serde(default = "default_vehicle")]
    pub default_vehicle: String,
    /// Answer `/api/payment` with success even when the reservation write fails.
    #[serde(default = "default_true")]
    pub swallow_persistence_failures: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_vehicle: default_vehicle(),
            swallow_persistence_failures: true,
        }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_thirty() -> u64 { 30 }
fn default_max_lifetime() -> u64 { 1800 }
fn default_true() -> bool { true }
fn default_vehicle() -> String { vipride_core::booking::DEFAULT_VEHICLE.to_string() }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `VIPRIDE_DATABASE__URL=mysql://...`
            .add_source(config::Environment::with_prefix("VIPRIDE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
