use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use gavel_contract::{Ledger, Receipt, TxParams, WriteCall};
use gavel_types::{AuctionListSnapshot, AuctionView, Identity, Wei};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::{ActionError, FetchError, Rejection, Snapshots, SyncError, Synchronizer};

/// Validates user actions against the latest snapshot and submits them.
#[derive(Debug)]
pub struct Coordinator<L> {
    ledger: Arc<L>,
    sync: Synchronizer<L>,
    snapshots: Snapshots,
}

impl<L> Clone for Coordinator<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            sync: self.sync.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

/// Outcome of one `withdraw()` within a sweep.
#[derive(Debug)]
pub struct Withdrawal {
    pub auction: Identity,
    pub amount: Wei,
    pub result: Result<Receipt, ActionError>,
}

/// Per-auction outcomes of [`Coordinator::withdraw`].
#[derive(Debug, Default)]
pub struct WithdrawReport {
    pub withdrawals: Vec<Withdrawal>,
    /// Balances that could not be read; those auctions were skipped.
    pub unreadable: Vec<FetchError>,
}

impl WithdrawReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &Withdrawal> {
        self.withdrawals.iter().filter(|w| w.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &Withdrawal> {
        self.withdrawals.iter().filter(|w| w.result.is_err())
    }

    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty() && self.withdrawals.iter().all(|w| w.result.is_ok())
    }
}

impl<L: Ledger + 'static> Coordinator<L> {
    pub fn new(ledger: Arc<L>, registry: Identity, fetch_timeout: Duration) -> Self {
        let sync = Synchronizer::new(ledger.clone(), registry, fetch_timeout);
        Self::with_parts(ledger, sync, Snapshots::new())
    }

    /// Share an existing synchronizer and snapshot channel, e.g. with a
    /// [`crate::Refresher`].
    pub fn with_parts(ledger: Arc<L>, sync: Synchronizer<L>, snapshots: Snapshots) -> Self {
        Self {
            ledger,
            sync,
            snapshots,
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    pub fn synchronizer(&self) -> &Synchronizer<L> {
        &self.sync
    }

    pub fn snapshots(&self) -> &Snapshots {
        &self.snapshots
    }

    /// The latest published snapshot, syncing first if there is none yet.
    pub async fn snapshot(&self) -> Result<Arc<AuctionListSnapshot>, SyncError> {
        if let Some(s) = self.snapshots.latest() {
            return Ok(s);
        }
        self.refresh().await
    }

    /// Sync and publish now.
    pub async fn refresh(&self) -> Result<Arc<AuctionListSnapshot>, SyncError> {
        let s = self.sync.sync().await?;
        Ok(self.snapshots.publish(s))
    }

    /// Sync and publish in the background.
    ///
    /// The resulting snapshot may or may not include the effects of a write
    /// that was just submitted.
    pub fn resync(&self) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            if let Err(err) = this.refresh().await {
                warn!(%err, "background re-sync failed")
            }
        })
    }

    pub async fn create_auction(
        &self,
        caller: Identity,
        bidding_time: u64,
        ttp: Identity,
    ) -> Result<Receipt, ActionError> {
        if bidding_time == 0 {
            return Err(Rejection::ZeroBiddingTime.into());
        }
        let registry = self.sync.registry().address();
        let call = WriteCall::CreateAuction { bidding_time, ttp };
        let receipt = self.submit(registry, call, TxParams::new(caller)).await?;
        match receipt.created {
            Some(a) => info!(auction = %a, %caller, %bidding_time, "auction created"),
            None => info!(%caller, %bidding_time, "auction creation confirmed"),
        }
        Ok(receipt)
    }

    pub async fn bid(
        &self,
        caller: Identity,
        auction: Identity,
        amount: Wei,
    ) -> Result<Receipt, ActionError> {
        let snapshot = self.snapshot().await?;
        let view = known(&snapshot, auction)?;
        if amount.is_zero() {
            return Err(Rejection::ZeroAmount.into());
        }
        if !snapshot.status(view, caller).biddable {
            return Err(Rejection::NotBiddable(auction).into());
        }
        let params = TxParams::new(caller).with_value(amount);
        let receipt = self.submit(auction, WriteCall::Bid, params).await?;
        info!(%auction, %caller, %amount, "bid placed");
        Ok(receipt)
    }

    pub async fn cancel_auction(
        &self,
        caller: Identity,
        auction: Identity,
    ) -> Result<Receipt, ActionError> {
        let snapshot = self.snapshot().await?;
        let view = known(&snapshot, auction)?;
        if !snapshot.status(view, caller).cancelable {
            return Err(Rejection::NotCancelable(auction).into());
        }
        if caller != view.beneficiary {
            return Err(Rejection::NotBeneficiary(auction).into());
        }
        let receipt = self
            .submit(auction, WriteCall::CancelAuction, TxParams::new(caller))
            .await?;
        info!(%auction, %caller, "auction cancelled");
        Ok(receipt)
    }

    pub async fn sign_auction(
        &self,
        caller: Identity,
        auction: Identity,
    ) -> Result<Receipt, ActionError> {
        let snapshot = self.snapshot().await?;
        let view = known(&snapshot, auction)?;
        if !snapshot.status(view, caller).signable {
            return Err(Rejection::NotSignable(auction).into());
        }
        let receipt = self
            .submit(auction, WriteCall::Sign, TxParams::new(caller))
            .await?;
        info!(%auction, %caller, "auction signed");
        Ok(receipt)
    }

    pub async fn end_auction(
        &self,
        caller: Identity,
        auction: Identity,
    ) -> Result<Receipt, ActionError> {
        let snapshot = self.snapshot().await?;
        let view = known(&snapshot, auction)?;
        if !snapshot.status(view, caller).endable {
            return Err(Rejection::NotEndable(auction).into());
        }
        let receipt = self
            .submit(auction, WriteCall::End, TxParams::new(caller))
            .await?;
        info!(%auction, %caller, "auction ended");
        Ok(receipt)
    }

    /// Refundable balances of `caller` in every auction the registry lists,
    /// terminal ones included. Zero balances are omitted.
    ///
    /// Runs a fresh sync and publishes it. The leading bid of a live auction
    /// stays locked and is not counted. Auctions that could not be fetched
    /// are reported as unreadable, since their lock cannot be evaluated.
    pub async fn refundable(
        &self,
        caller: Identity,
    ) -> Result<(Vec<(Identity, Wei)>, Vec<FetchError>), ActionError> {
        let (snapshot, mut unreadable) = self.sync.sync_with_report().await?;
        let snapshot = self.snapshots.publish(snapshot);
        let fetcher = self.sync.fetcher();
        let results = join_all(
            snapshot
                .all()
                .iter()
                .map(|v| fetcher.funds(v.address, caller)),
        )
        .await;

        let mut balances = Vec::new();
        for (v, r) in snapshot.all().iter().zip(results) {
            match r {
                Ok(funds) => {
                    let amount = funds.saturating_sub(locked(v, caller));
                    if !amount.is_zero() {
                        balances.push((v.address, amount))
                    }
                }
                Err(err) => {
                    warn!(auction = %v.address, %err, "failed to read refundable balance");
                    unreadable.push(err)
                }
            }
        }
        Ok((balances, unreadable))
    }

    /// Withdraw every refundable balance of `caller`.
    ///
    /// Each withdrawal is submitted on its own, one after the other; a
    /// failing one does not prevent the rest.
    pub async fn withdraw(&self, caller: Identity) -> Result<WithdrawReport, ActionError> {
        let (balances, unreadable) = self.refundable(caller).await?;
        if balances.is_empty() && unreadable.is_empty() {
            return Err(Rejection::NothingToWithdraw.into());
        }

        let mut report = WithdrawReport {
            withdrawals: Vec::with_capacity(balances.len()),
            unreadable,
        };
        for (auction, amount) in balances {
            let result = self
                .ledger
                .send(auction, WriteCall::Withdraw, TxParams::new(caller))
                .await
                .map_err(ActionError::TransactionFailed);
            match &result {
                Ok(_) => info!(%auction, %caller, %amount, "funds withdrawn"),
                Err(err) => warn!(%auction, %caller, %err, "withdrawal failed"),
            }
            report.withdrawals.push(Withdrawal {
                auction,
                amount,
                result,
            });
        }

        if report.succeeded().next().is_some() {
            self.resync();
        }
        Ok(report)
    }

    async fn submit(
        &self,
        contract: Identity,
        call: WriteCall,
        params: TxParams,
    ) -> Result<Receipt, ActionError> {
        match self.ledger.send(contract, call, params).await {
            Ok(receipt) => {
                self.resync();
                Ok(receipt)
            }
            Err(err) => {
                warn!(%contract, method = %call.method(), %err, "transaction failed");
                Err(ActionError::TransactionFailed(err))
            }
        }
    }
}

/// Part of `caller`'s funds the auction holds back as the leading bid.
fn locked(view: &AuctionView, caller: Identity) -> Wei {
    if caller == view.highest_bidder && !view.is_terminal() {
        view.highest_bid
    } else {
        Wei::ZERO
    }
}

fn known(snapshot: &AuctionListSnapshot, auction: Identity) -> Result<&AuctionView, Rejection> {
    snapshot
        .get(auction)
        .ok_or(Rejection::UnknownAuction(auction))
}
