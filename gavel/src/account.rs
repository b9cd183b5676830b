use std::sync::Arc;

use gavel_contract::{Ledger, LedgerError};
use gavel_types::Identity;
use parking_lot::RwLock;
use tracing::info;

/// The identity actions are performed as.
///
/// Read it once per action and pass the value on, so that guard evaluation
/// and submission agree on who the caller is.
#[derive(Debug, Clone, Default)]
pub struct CurrentAccount(Arc<RwLock<Option<Identity>>>);

impl CurrentAccount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Identity> {
        *self.0.read()
    }

    pub fn set(&self, id: Identity) {
        *self.0.write() = Some(id);
        info!(account = %id, "current account set")
    }

    /// Pick the first account the ledger manages, unless one is set already.
    pub async fn select_default<L>(&self, ledger: &L) -> Result<Option<Identity>, LedgerError>
    where
        L: Ledger,
    {
        if let Some(id) = self.get() {
            return Ok(Some(id));
        }
        let first = ledger.accounts().await?.into_iter().next();
        if let Some(id) = first {
            self.set(id)
        }
        Ok(first)
    }
}
