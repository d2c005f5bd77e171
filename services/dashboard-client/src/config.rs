//! Client Configuration
//!
//! Values come from `DASHBOARD_*` environment variables with built-in
//! defaults that match the backend's own defaults.

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

use crate::jobs::PollPolicy;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEFRAMES: &str = "15m,1h,4h,1d,1w";

/// Runtime settings for the dashboard client
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub request_timeout_secs: u64,
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
    /// Comma-separated list, e.g. `1h,4h`
    pub timeframes: String,
    pub history_years: u32,
    pub bot_interval_secs: u64,
}

impl Settings {
    /// Load settings from the environment
    pub fn load() -> anyhow::Result<Self> {
        Self::from_source(::config::Environment::with_prefix("DASHBOARD"))
    }

    fn from_source<S>(source: S) -> anyhow::Result<Self>
    where
        S: ::config::Source + Send + Sync + 'static,
    {
        let settings = ::config::Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("request_timeout_secs", 30_i64)?
            .set_default("poll_interval_ms", 1500_i64)?
            .set_default("timeframes", DEFAULT_TIMEFRAMES)?
            .set_default("history_years", 3_i64)?
            .set_default("bot_interval_secs", 60_i64)?
            .add_source(source)
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize()
            .context("Invalid DASHBOARD_* configuration")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts.filter(|n| *n > 0),
        }
    }

    /// Default timeframes as a list
    pub fn timeframes(&self) -> Vec<String> {
        split_list(&self.timeframes)
    }
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> ::config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ::config::Environment::with_prefix("DASHBOARD").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let s = Settings::from_source(env(&[])).unwrap();
        assert_eq!(s.base_url, DEFAULT_BASE_URL);
        assert_eq!(s.request_timeout(), Duration::from_secs(30));
        assert_eq!(s.poll_policy(), PollPolicy::default());
        assert_eq!(s.timeframes(), vec!["15m", "1h", "4h", "1d", "1w"]);
        assert_eq!(s.history_years, 3);
        assert_eq!(s.bot_interval_secs, 60);
    }

    #[test]
    fn test_environment_overrides() {
        let s = Settings::from_source(env(&[
            ("DASHBOARD_BASE_URL", "http://10.0.0.5:8000"),
            ("DASHBOARD_POLL_INTERVAL_MS", "250"),
            ("DASHBOARD_MAX_POLL_ATTEMPTS", "40"),
            ("DASHBOARD_TIMEFRAMES", "1h, 4h"),
        ]))
        .unwrap();
        assert_eq!(s.base_url, "http://10.0.0.5:8000");
        assert_eq!(s.poll_policy().interval, Duration::from_millis(250));
        assert_eq!(s.poll_policy().max_attempts, Some(40));
        assert_eq!(s.timeframes(), vec!["1h", "4h"]);
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(" 1h,,4h , "), vec!["1h", "4h"]);
        assert!(split_list("").is_empty());
    }
}
