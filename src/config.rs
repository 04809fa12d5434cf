//! Client configuration.
//!
//! [`ClientConfig::from_env`] reads:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `QTASK_S3_BUCKET` | default output bucket | none |
//! | `QTASK_S3_PREFIX` | default output key prefix | `tasks` |
//! | `QTASK_POLL_TIMEOUT_SECS` | poll timeout | 432000 (5 days) |
//! | `QTASK_POLL_INTERVAL_SECS` | poll interval | 1 |

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};
use crate::input::OutputLocation;

/// Default poll timeout: five days.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 24 * 60 * 60);

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Polling behaviour of a task handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Give up waiting after this long.
    #[serde(rename = "timeout_secs", with = "secs")]
    pub timeout: Duration,
    /// Sleep between status fetches.
    #[serde(rename = "interval_secs", with = "secs")]
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_POLL_TIMEOUT,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollConfig {
    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Client-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Output location used when a task's metadata does not report one.
    #[serde(default)]
    pub destination: Option<OutputLocation>,
    /// Polling behaviour.
    #[serde(default)]
    pub poll: PollConfig,
}

impl ClientConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> TaskResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TaskResult<Self> {
        let destination = lookup("QTASK_S3_BUCKET").map(|bucket| {
            let prefix = lookup("QTASK_S3_PREFIX").unwrap_or_else(|| "tasks".to_string());
            OutputLocation::new(bucket, prefix)
        });

        let mut poll = PollConfig::default();
        if let Some(raw) = lookup("QTASK_POLL_TIMEOUT_SECS") {
            poll.timeout = parse_secs("QTASK_POLL_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = lookup("QTASK_POLL_INTERVAL_SECS") {
            poll.interval = parse_secs("QTASK_POLL_INTERVAL_SECS", &raw)?;
        }

        Ok(Self { destination, poll })
    }

    /// Output location for `task_id` under the configured destination.
    pub fn task_location(&self, task_id: &str) -> Option<OutputLocation> {
        self.destination.as_ref().map(|dest| {
            OutputLocation::new(
                dest.bucket.clone(),
                format!("{}/{task_id}", dest.key_prefix.trim_end_matches('/')),
            )
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> TaskResult<Duration> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .ok_or_else(|| TaskError::Configuration(format!("{key}: expected seconds, got {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.destination.is_none());
        assert_eq!(config.poll.timeout, Duration::from_secs(432_000));
        assert_eq!(config.poll.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_from_lookup() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("QTASK_S3_BUCKET", "results"),
            ("QTASK_POLL_TIMEOUT_SECS", "30"),
            ("QTASK_POLL_INTERVAL_SECS", "0.25"),
        ]))
        .unwrap();
        assert_eq!(
            config.destination,
            Some(OutputLocation::new("results", "tasks"))
        );
        assert_eq!(config.poll.timeout, Duration::from_secs(30));
        assert_eq!(config.poll.interval, Duration::from_millis(250));

        let location = config.task_location("t-1").unwrap();
        assert_eq!(location.results_key(), "tasks/t-1/results.json");
    }

    #[test]
    fn test_bad_number() {
        let err = ClientConfig::from_lookup(lookup(&[("QTASK_POLL_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, TaskError::Configuration(_)));

        let err = ClientConfig::from_lookup(lookup(&[("QTASK_POLL_INTERVAL_SECS", "-1")]))
            .unwrap_err();
        assert!(matches!(err, TaskError::Configuration(_)));
    }

    #[test]
    fn test_poll_config_serde() {
        let poll = PollConfig::default().with_timeout(Duration::from_secs(10));
        let json = serde_json::to_value(poll).unwrap();
        assert_eq!(json["timeout_secs"], 10.0);
        let back: PollConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, poll);
    }
}
