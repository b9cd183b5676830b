use std::sync::Arc;

use gavel_contract::{Ledger, ReadCall};
use gavel_types::Identity;
use tracing::{debug, error};

use crate::SyncError;

/// Lists the auctions known to the registry contract.
#[derive(Debug)]
pub struct RegistryClient<L> {
    ledger: Arc<L>,
    registry: Identity,
}

impl<L> Clone for RegistryClient<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            registry: self.registry,
        }
    }
}

impl<L: Ledger> RegistryClient<L> {
    pub fn new(ledger: Arc<L>, registry: Identity) -> Self {
        Self { ledger, registry }
    }

    pub fn address(&self) -> Identity {
        self.registry
    }

    /// Addresses of all auctions, in registry order.
    ///
    /// A failure here must not be mistaken for an empty registry.
    pub async fn list_auctions(&self) -> Result<Vec<Identity>, SyncError> {
        let list = self
            .ledger
            .read(self.registry, ReadCall::ListAuctions)
            .await
            .and_then(|v| v.into_addresses())
            .map_err(|err| {
                error!(registry = %self.registry, %err, "failed to list auctions");
                SyncError::GatewayUnavailable(err)
            })?;
        debug!(registry = %self.registry, auctions = %list.len(), "listed auctions");
        Ok(list)
    }
}
