//! # Engine Configuration
//!
//! Sizing and time budgets for the order engine. Defaults match a small single-process
//! deployment; every field can be overridden from the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `BOOKSHOP_WORKERS` | `workers` | 10 |
//! | `BOOKSHOP_QUEUE_CAPACITY` | `queue_capacity` | 256 |
//! | `BOOKSHOP_BATCH_TIMEOUT_MS` | `batch_timeout_ms` | 5000 |
//! | `BOOKSHOP_REQUEST_TIMEOUT_MS` | `request_timeout_ms` | 10000 |
//! | `BOOKSHOP_RECOMMENDATION_WORKERS` | `recommendation_workers` | 3 |

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker tasks executing per-item stock operations.
    pub workers: usize,
    /// Jobs that may wait in the queue before submissions are rejected.
    pub queue_capacity: usize,
    /// Budget for joining one batch of item tasks.
    pub batch_timeout_ms: u64,
    /// Budget for a whole create or update request, order assembly included.
    pub request_timeout_ms: u64,
    /// Worker tasks for the recommendation lookups.
    pub recommendation_workers: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_capacity: 256,
            batch_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            recommendation_workers: 3,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by any `BOOKSHOP_*` variables that are set and valid.
    ///
    /// Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        override_with(&lookup, "BOOKSHOP_WORKERS", &mut config.workers);
        override_with(&lookup, "BOOKSHOP_QUEUE_CAPACITY", &mut config.queue_capacity);
        override_with(&lookup, "BOOKSHOP_BATCH_TIMEOUT_MS", &mut config.batch_timeout_ms);
        override_with(&lookup, "BOOKSHOP_REQUEST_TIMEOUT_MS", &mut config.request_timeout_ms);
        override_with(
            &lookup,
            "BOOKSHOP_RECOMMENDATION_WORKERS",
            &mut config.recommendation_workers,
        );
        config
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn override_with<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    field: &mut T,
) {
    let Some(raw) = lookup(name) else { return };
    match raw.trim().parse() {
        Ok(value) => *field = value,
        Err(_) => warn!(variable = name, value = %raw, "Ignoring invalid configuration value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.workers, 10);
        assert_eq!(config.batch_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_overrides_and_ignores_invalid_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BOOKSHOP_WORKERS", "4"),
            ("BOOKSHOP_BATCH_TIMEOUT_MS", " 250 "),
            ("BOOKSHOP_QUEUE_CAPACITY", "lots"),
        ]);
        let config = EngineConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.workers, 4);
        assert_eq!(config.batch_timeout(), Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 256);
        assert_eq!(config.request_timeout_ms, 10_000);
    }
}
