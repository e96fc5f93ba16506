mod env;

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::Path;

pub use crate::connection::StreamConfig;
pub use crate::history::HistoryConfig;
pub use crate::preferences::PreferencesConfig;
pub use crate::state::StoreConfig;

/// Complete firewatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FirewatchConfig {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub preferences: PreferencesConfig,
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FirewatchConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: FirewatchConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

impl FirewatchConfig {
    /// Reject settings the live store cannot work with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.store.alert_capacity > 0,
            "store.alert_capacity must be at least 1"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = FirewatchConfig::default();
        assert_eq!(config.stream.url, "ws://localhost:8080/ws");
        assert_eq!(config.stream.reconnect_delay_ms, 3000);
        assert_eq!(config.store.alert_capacity, 50);
        assert_eq!(config.store.man_down_threshold_s, 30.0);
        assert_eq!(config.history.base_url, "http://localhost:8000/api");
        assert_eq!(config.history.timeout_seconds, 30);
        assert_eq!(config.preferences.path, "firewatch.db");
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [stream]
            url = "wss://incident.example.org/ws"
            reconnect_delay_ms = 5000

            [store]
            alert_capacity = 100
            man_down_threshold_s = 45.0

            [history]
            base_url = "https://incident.example.org/api"
            timeout_seconds = 10

            [preferences]
            path = "/var/lib/firewatch/prefs.db"
        "#;

        let config: FirewatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.stream.url, "wss://incident.example.org/ws");
        assert_eq!(config.stream.reconnect_delay_ms, 5000);
        assert_eq!(config.store.alert_capacity, 100);
        assert_eq!(config.store.man_down_threshold_s, 45.0);
        assert_eq!(config.history.timeout_seconds, 10);
        assert_eq!(config.preferences.path, "/var/lib/firewatch/prefs.db");
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and keys use defaults
        let toml = r#"
            [store]
            alert_capacity = 20
        "#;

        let config: FirewatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.store.alert_capacity, 20);
        assert_eq!(config.store.man_down_threshold_s, 30.0); // Default
        assert_eq!(config.stream.reconnect_delay_ms, 3000); // Default
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stream]\nurl = \"ws://10.0.0.5:8080/ws\"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.stream.url, "ws://10.0.0.5:8080/ws");
    }

    #[test]
    fn test_zero_alert_capacity_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nalert_capacity = 0").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));
        assert!(format!("{:#}", err).contains("alert_capacity"));
    }

    #[test]
    fn test_load_config_errors_name_the_file() {
        let err = load_config("/nonexistent/firewatch.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/firewatch.toml"));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[stream\nurl = 1").unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
