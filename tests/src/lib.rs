use std::sync::Arc;
use std::time::Duration;

use gavel::{Coordinator, Identity, Timestamp};
use gavel_config::{GavelConfig, SyncConfig};
use gavel_contract::testing::MemoryLedger;

#[cfg(test)]
mod tests;

pub const REGISTRY: Identity = Identity::from_bytes([0xee; 20]);
pub const ALICE: Identity = Identity::from_bytes([0xa1; 20]);
pub const BOB: Identity = Identity::from_bytes([0xb0; 20]);
pub const CAROL: Identity = Identity::from_bytes([0xc0; 20]);
pub const DAVE: Identity = Identity::from_bytes([0xd0; 20]);

/// A ledger with four funded accounts and a coordinator on top of it.
pub struct Market {
    pub ledger: Arc<MemoryLedger>,
    pub coordinator: Coordinator<MemoryLedger>,
    pub config: SyncConfig,
}

impl Market {
    pub fn new(now: u64) -> Self {
        let config = SyncConfig::builder()
            .fetch_timeout_ms(250)
            .refresh_interval_secs(3600)
            .build();
        Self::with_config(now, config)
    }

    pub fn with_config(now: u64, config: SyncConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new(
            REGISTRY,
            [ALICE, BOB, CAROL, DAVE],
            Timestamp::from(now),
        ));
        let coordinator = Coordinator::new(ledger.clone(), REGISTRY, config.fetch_timeout());
        Self {
            ledger,
            coordinator,
            config,
        }
    }

    /// Parse a configuration file and build the market from its sync section.
    pub fn from_toml(now: u64, toml: &str) -> Self {
        let cfg = GavelConfig::parse(toml).expect("valid config");
        assert_eq!(cfg.chain.registry, REGISTRY);
        Self::with_config(now, cfg.sync)
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.config.fetch_timeout()
    }
}
