use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::usecase::connections::RegistrySettings;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_realtime_buffer_size")]
    pub realtime_buffer_size: usize,
    #[serde(default = "default_realtime_max_sessions_per_user")]
    pub realtime_max_sessions_per_user: usize,
    /// Heartbeat ping period for WebSocket sessions; 0 disables pings.
    #[serde(default = "default_realtime_ping_interval_secs")]
    pub realtime_ping_interval_secs: u64,
    #[serde(default)]
    pub telemetry_enabled: bool,
    #[serde(default = "default_telemetry_service_name")]
    pub telemetry_service_name: String,
    #[serde(default = "default_telemetry_service_version")]
    pub telemetry_service_version: String,
    #[serde(default = "default_telemetry_environment")]
    pub telemetry_environment: String,
    #[serde(default = "default_telemetry_otlp_endpoint")]
    pub telemetry_otlp_endpoint: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_realtime_buffer_size() -> usize {
    32
}

fn default_realtime_max_sessions_per_user() -> usize {
    5
}

fn default_realtime_ping_interval_secs() -> u64 {
    30
}

fn default_telemetry_service_name() -> String {
    "social-notifications".to_string()
}

fn default_telemetry_service_version() -> String {
    "1.0.0".to_string()
}

fn default_telemetry_environment() -> String {
    "production".to_string()
}

fn default_telemetry_otlp_endpoint() -> String {
    "http://otel-collector.observability.svc.cluster.local:4317".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(Environment::default())
    }

    fn from_source(source: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_max_connections", 5)?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            buffer_size: self.realtime_buffer_size,
            max_sessions_per_user: self.realtime_max_sessions_per_user,
        }
    }

    pub fn ping_interval(&self) -> Option<Duration> {
        (self.realtime_ping_interval_secs > 0).then(|| Duration::from_secs(self.realtime_ping_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::default().source(Some(map))
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_source(env(&[
            ("DATABASE_URL", "postgres://localhost/social"),
            ("JWT_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.registry_settings().buffer_size, 32);
        assert_eq!(config.registry_settings().max_sessions_per_user, 5);
        assert_eq!(config.ping_interval(), Some(Duration::from_secs(30)));
        assert!(!config.telemetry_enabled);
    }

    #[test]
    fn test_realtime_overrides() {
        let config = AppConfig::from_source(env(&[
            ("DATABASE_URL", "postgres://localhost/social"),
            ("JWT_SECRET", "secret"),
            ("REALTIME_BUFFER_SIZE", "8"),
            ("REALTIME_MAX_SESSIONS_PER_USER", "1"),
            ("REALTIME_PING_INTERVAL_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.registry_settings().buffer_size, 8);
        assert_eq!(config.registry_settings().max_sessions_per_user, 1);
        assert_eq!(config.ping_interval(), None);
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        let result = AppConfig::from_source(env(&[("JWT_SECRET", "secret")]));
        assert!(result.is_err());
    }
}
