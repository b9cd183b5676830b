use std::time::Duration;

use bon::Builder;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "kebab-case")]
pub struct SyncConfig {
    /// Upper bound for fetching a single auction and for each gateway read
    /// a sync cycle starts with. Must be non-zero.
    #[serde(default = "default_fetch_timeout_ms", deserialize_with = "non_zero")]
    #[builder(default = DEFAULT_FETCH_TIMEOUT_MS)]
    fetch_timeout_ms: u64,

    /// Period of the background refresh loop. Must be non-zero.
    #[serde(default = "default_refresh_interval_secs", deserialize_with = "non_zero")]
    #[builder(default = DEFAULT_REFRESH_INTERVAL_SECS)]
    refresh_interval_secs: u64,
}

impl SyncConfig {
    /// Never zero; a zero value from the builder is treated as 1ms.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms.max(1))
    }

    /// Never zero; a zero value from the builder is treated as 1s.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn non_zero<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let n = u64::deserialize(d)?;
    if n == 0 {
        return Err(D::Error::custom("must be greater than zero"));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::SyncConfig;

    #[test]
    fn zero_is_rejected() {
        assert!(toml::from_str::<SyncConfig>("fetch-timeout-ms = 0").is_err());
        assert!(toml::from_str::<SyncConfig>("refresh-interval-secs = 0").is_err());
        let c = toml::from_str::<SyncConfig>("refresh-interval-secs = 1").unwrap();
        assert_eq!(c.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_from_builder_is_clamped() {
        let c = SyncConfig::builder()
            .fetch_timeout_ms(0)
            .refresh_interval_secs(0)
            .build();
        assert_eq!(c.fetch_timeout(), Duration::from_millis(1));
        assert_eq!(c.refresh_interval(), Duration::from_secs(1));
    }
}
