use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use gavel_contract::{Ledger, LedgerError};
use gavel_types::{AuctionListSnapshot, AuctionView, Identity};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::{FetchCause, FetchError, RegistryClient, StateFetcher, SyncError};

/// Builds time-consistent snapshots of all auctions of a registry.
#[derive(Debug)]
pub struct Synchronizer<L> {
    ledger: Arc<L>,
    registry: RegistryClient<L>,
    fetcher: StateFetcher<L>,
    fetch_timeout: Duration,
}

impl<L> Clone for Synchronizer<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            registry: self.registry.clone(),
            fetcher: self.fetcher.clone(),
            fetch_timeout: self.fetch_timeout,
        }
    }
}

impl<L: Ledger> Synchronizer<L> {
    pub fn new(ledger: Arc<L>, registry: Identity, fetch_timeout: Duration) -> Self {
        Self {
            registry: RegistryClient::new(ledger.clone(), registry),
            fetcher: StateFetcher::new(ledger.clone()),
            ledger,
            fetch_timeout,
        }
    }

    pub fn registry(&self) -> &RegistryClient<L> {
        &self.registry
    }

    pub fn fetcher(&self) -> &StateFetcher<L> {
        &self.fetcher
    }

    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    pub async fn sync(&self) -> Result<AuctionListSnapshot, SyncError> {
        self.sync_with_report().await.map(|(s, _)| s)
    }

    /// Like [`Self::sync`] but also returns the fetch failures that were
    /// excluded from the snapshot.
    pub async fn sync_with_report(
        &self,
    ) -> Result<(AuctionListSnapshot, Vec<FetchError>), SyncError> {
        let reference = timeout(self.fetch_timeout, self.ledger.latest_timestamp())
            .await
            .map_err(|_| gateway_timeout("latest block timestamp"))?
            .map_err(SyncError::GatewayUnavailable)?;

        let addresses = timeout(self.fetch_timeout, self.registry.list_auctions())
            .await
            .map_err(|_| gateway_timeout("registry auction list"))??;

        let results = join_all(addresses.iter().map(|a| self.fetch_bounded(*a))).await;

        let mut views = Vec::with_capacity(results.len());
        let mut failed = Vec::new();
        for r in results {
            match r {
                Ok(v) => views.push(v),
                Err(err) => {
                    warn!(auction = %err.address, %err, "excluding auction from snapshot");
                    failed.push(err)
                }
            }
        }

        debug!(
            %reference,
            auctions = %views.len(),
            failed = %failed.len(),
            "snapshot complete"
        );

        Ok((AuctionListSnapshot::new(reference, views), failed))
    }

    async fn fetch_bounded(&self, address: Identity) -> Result<AuctionView, FetchError> {
        match timeout(self.fetch_timeout, self.fetcher.fetch(address)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(address, FetchCause::Timeout)),
        }
    }
}

fn gateway_timeout(what: &str) -> SyncError {
    let err = LedgerError::Unavailable(format!("no {what} within the fetch timeout"));
    warn!(%err, "sync aborted");
    SyncError::GatewayUnavailable(err)
}

/// The most recently completed snapshot.
///
/// Publishing always replaces the current value, so when several syncs
/// overlap the one completing last wins.
#[derive(Debug, Clone)]
pub struct Snapshots {
    tx: Arc<watch::Sender<Option<Arc<AuctionListSnapshot>>>>,
}

impl Default for Snapshots {
    fn default() -> Self {
        Self::new()
    }
}

impl Snapshots {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn publish(&self, s: AuctionListSnapshot) -> Arc<AuctionListSnapshot> {
        let s = Arc::new(s);
        self.tx.send_replace(Some(s.clone()));
        s
    }

    pub fn latest(&self) -> Option<Arc<AuctionListSnapshot>> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<AuctionListSnapshot>>> {
        self.tx.subscribe()
    }
}
