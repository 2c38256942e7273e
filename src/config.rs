/*!
 * Dispatcher Configuration
 * Runtime settings with builder methods and environment overrides
 *
 * Environment variables:
 * - DISPATCH_TIME_ORDERING: `strict` or `non_decreasing` (default: non_decreasing)
 * - DISPATCH_REPORT_FORMAT: `text` or `json` (default: text)
 * - DISPATCH_TRACE_JSON: `1`/`true` for JSON log lines (default: false)
 * - DISPATCH_CHANNEL_CAPACITY: reader-to-engine channel size (default: 1024)
 * - DISPATCH_STRICT_INVARIANTS: `1`/`true` to fail when processes are left alive
 */

use crate::core::errors::{ConfigError, ConfigResult};
use crate::core::limits::{DEFAULT_CHANNEL_CAPACITY, MAX_CHANNEL_CAPACITY};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const ENV_TIME_ORDERING: &str = "DISPATCH_TIME_ORDERING";
pub const ENV_REPORT_FORMAT: &str = "DISPATCH_REPORT_FORMAT";
pub const ENV_TRACE_JSON: &str = "DISPATCH_TRACE_JSON";
pub const ENV_CHANNEL_CAPACITY: &str = "DISPATCH_CHANNEL_CAPACITY";
pub const ENV_STRICT_INVARIANTS: &str = "DISPATCH_STRICT_INVARIANTS";

/// How event timestamps must relate to the previous accepted event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOrdering {
    /// Each event must be strictly later than the previous one
    Strict,
    /// Several events may share a timestamp; time never goes back
    #[default]
    NonDecreasing,
}

impl FromStr for TimeOrdering {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "non_decreasing" | "nondecreasing" | "relaxed" => Ok(Self::NonDecreasing),
            _ => Err(invalid(ENV_TIME_ORDERING, s, "strict or non_decreasing")),
        }
    }
}

impl TimeOrdering {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::NonDecreasing => "non_decreasing",
        }
    }
}

/// Final report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// `pid run ready block` lines, idle process first
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(invalid(ENV_REPORT_FORMAT, s, "text or json")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DispatcherConfig {
    pub time_ordering: TimeOrdering,
    pub report_format: ReportFormat,
    pub trace_json: bool,
    pub channel_capacity: usize,
    /// Treat processes left alive at end of input as a failure
    pub strict_invariants: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            time_ordering: TimeOrdering::default(),
            report_format: ReportFormat::default(),
            trace_json: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            strict_invariants: false,
        }
    }
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `DISPATCH_*` environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_TIME_ORDERING) {
            config.time_ordering = v.parse()?;
        }
        if let Some(v) = lookup(ENV_REPORT_FORMAT) {
            config.report_format = v.parse()?;
        }
        if let Some(v) = lookup(ENV_TRACE_JSON) {
            config.trace_json = parse_flag(ENV_TRACE_JSON, &v)?;
        }
        if let Some(v) = lookup(ENV_CHANNEL_CAPACITY) {
            let capacity = v
                .trim()
                .parse::<usize>()
                .map_err(|_| invalid(ENV_CHANNEL_CAPACITY, &v, "a positive integer"))?;
            config = config.with_channel_capacity(capacity)?;
        }
        if let Some(v) = lookup(ENV_STRICT_INVARIANTS) {
            config.strict_invariants = parse_flag(ENV_STRICT_INVARIANTS, &v)?;
        }
        Ok(config)
    }

    pub fn with_time_ordering(mut self, ordering: TimeOrdering) -> Self {
        self.time_ordering = ordering;
        self
    }

    pub fn with_report_format(mut self, format: ReportFormat) -> Self {
        self.report_format = format;
        self
    }

    pub fn with_trace_json(mut self, enabled: bool) -> Self {
        self.trace_json = enabled;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> ConfigResult<Self> {
        if capacity == 0 || capacity > MAX_CHANNEL_CAPACITY {
            return Err(invalid(
                ENV_CHANNEL_CAPACITY,
                &capacity.to_string(),
                "a capacity between 1 and 1048576",
            ));
        }
        self.channel_capacity = capacity;
        Ok(self)
    }

    pub fn with_strict_invariants(mut self, enabled: bool) -> Self {
        self.strict_invariants = enabled;
        self
    }
}

fn parse_flag(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, value, "a boolean flag")),
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, DispatcherConfig::default());
        assert_eq!(config.time_ordering, TimeOrdering::NonDecreasing);
        assert_eq!(config.report_format, ReportFormat::Text);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_env_overrides() {
        let config = DispatcherConfig::from_lookup(lookup(&[
            (ENV_TIME_ORDERING, "strict"),
            (ENV_REPORT_FORMAT, "JSON"),
            (ENV_TRACE_JSON, "1"),
            (ENV_CHANNEL_CAPACITY, "16"),
            (ENV_STRICT_INVARIANTS, "true"),
        ]))
        .unwrap();
        assert_eq!(config.time_ordering, TimeOrdering::Strict);
        assert_eq!(config.report_format, ReportFormat::Json);
        assert!(config.trace_json);
        assert_eq!(config.channel_capacity, 16);
        assert!(config.strict_invariants);
    }

    #[test]
    fn test_invalid_values() {
        assert!(DispatcherConfig::from_lookup(lookup(&[(ENV_TIME_ORDERING, "sometimes")])).is_err());
        assert!(DispatcherConfig::from_lookup(lookup(&[(ENV_CHANNEL_CAPACITY, "0")])).is_err());
        assert!(DispatcherConfig::from_lookup(lookup(&[(ENV_CHANNEL_CAPACITY, "many")])).is_err());
        assert!(DispatcherConfig::from_lookup(lookup(&[(ENV_TRACE_JSON, "maybe")])).is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: DispatcherConfig =
            serde_json::from_str(r#"{"time_ordering":"strict","report_format":"json"}"#).unwrap();
        assert_eq!(config.time_ordering, TimeOrdering::Strict);
        assert_eq!(config.report_format, ReportFormat::Json);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }
}
