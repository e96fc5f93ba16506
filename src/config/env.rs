use super::FirewatchConfig;
use tracing::warn;

pub const ENV_STREAM_URL: &str = "FIREWATCH_STREAM_URL";
pub const ENV_HISTORY_URL: &str = "FIREWATCH_HISTORY_URL";
pub const ENV_RECONNECT_DELAY_MS: &str = "FIREWATCH_RECONNECT_DELAY_MS";
pub const ENV_PREFERENCES_PATH: &str = "FIREWATCH_PREFERENCES_PATH";

impl FirewatchConfig {
    /// Override file settings from environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Override settings from `lookup`. Unparseable values are logged and
    /// ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_STREAM_URL) {
            self.stream.url = v;
        }
        if let Some(v) = lookup(ENV_HISTORY_URL) {
            self.history.base_url = v;
        }
        if let Some(v) = lookup(ENV_RECONNECT_DELAY_MS) {
            match v.parse::<u64>() {
                Ok(ms) => self.stream.reconnect_delay_ms = ms,
                Err(_) => warn!(var = ENV_RECONNECT_DELAY_MS, value = %v, "Ignoring invalid value"),
            }
        }
        if let Some(v) = lookup(ENV_PREFERENCES_PATH) {
            self.preferences.path = v;
        }
    }
}
