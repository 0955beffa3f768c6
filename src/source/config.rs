//! Policy defaults for a source.

use std::time::Duration;

use serde::Deserialize;

/// Longest query ceiling honoured. Larger configured values are clamped to it.
pub const MAX_QUERY_CEILING: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Timing and pooling policy of a [`Source`](super::Source).
///
/// Every field has a default, so a partial document deserializes:
///
/// ```rust
/// # use svcbase::SourceConfig;
/// let config: SourceConfig = serde_json::from_str(r#"{"client_timeout_secs": 2}"#).unwrap();
/// assert_eq!(config.query_ceiling_secs, 5);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceConfig {
    /// Upper bound on any single query, whatever deadline the caller passes.
    /// Clamped to [`MAX_QUERY_CEILING`].
    pub query_ceiling_secs: u64,
    /// Per-exchange timeout of the default transport.
    pub client_timeout_secs: u64,
    /// Idle connections kept per host by the default transport.
    pub pool_max_idle_per_host: usize,
}

impl SourceConfig {
    pub fn query_ceiling(&self) -> Duration {
        Duration::from_secs(self.query_ceiling_secs).min(MAX_QUERY_CEILING)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            query_ceiling_secs: 5,
            client_timeout_secs: 5,
            pool_max_idle_per_host: 100,
        }
    }
}
