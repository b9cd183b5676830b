use bon::Builder;
use gavel_types::Identity;
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "kebab-case")]
pub struct ChainConfig {
    /// Expected chain id; checked against the node when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    pub rpc_url: Url,

    /// Websocket endpoint for event subscriptions. Without it `watch` only
    /// refreshes periodically.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_url: Option<Url>,

    /// Address of the auction registry (factory) contract.
    pub registry: Identity,
}
