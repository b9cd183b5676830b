mod chain;
mod sync;
mod wallet;

use std::path::{Path, PathBuf};

use bon::Builder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub use chain::{ChainConfig, ChainConfigBuilder};
pub use sync::{SyncConfig, SyncConfigBuilder};
pub use wallet::WalletConfig;

#[derive(Debug, thiserror::Error)]
#[error("config error {0}: {1}")]
pub struct ConfigError(PathBuf, #[source] Box<dyn std::error::Error + Send + Sync>);

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "kebab-case")]
pub struct GavelConfig {
    pub chain: ChainConfig,

    #[serde(default)]
    #[builder(default)]
    pub sync: SyncConfig,

    /// Sign locally with a mnemonic instead of using node-managed accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<WalletConfig>,
}

impl GavelConfig {
    pub async fn read<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        read_toml(path).await
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

pub(crate) async fn read_toml<T, P>(path: P) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let s = tokio::fs::read_to_string(path.as_ref())
        .await
        .map_err(|e| ConfigError(path.as_ref().into(), Box::new(e)))?;
    toml::from_str(&s).map_err(|e| ConfigError(path.as_ref().into(), Box::new(e)))
}
