use std::sync::Arc;

use alloy::primitives::U256;
use gavel_contract::{Ledger, LedgerError, ReadCall, Value};
use gavel_types::{AuctionView, Identity, Timestamp, Wei};

use crate::{FetchCause, FetchError};

/// Reconstructs the state of single auctions from read calls.
#[derive(Debug)]
pub struct StateFetcher<L> {
    ledger: Arc<L>,
}

impl<L> Clone for StateFetcher<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
        }
    }
}

impl<L: Ledger> StateFetcher<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Read every field of an auction.
    ///
    /// The reads are issued in a fixed order and the first failure fails the
    /// whole fetch; a partially populated view is never returned.
    pub async fn fetch(&self, address: Identity) -> Result<AuctionView, FetchError> {
        let err = |cause| FetchError::new(address, cause);

        let beneficiary = self.read(address, ReadCall::Beneficiary, Value::into_address).await?;
        let ttp = self.read(address, ReadCall::Ttp, Value::into_address).await?;
        let highest_bidder = self.read(address, ReadCall::HighestBidder, Value::into_address).await?;
        let highest_bid = self.read(address, ReadCall::HighestBid, Value::into_uint).await?;
        let end_time = self.read(address, ReadCall::EndTime, Value::into_uint).await?;
        let sig_count = self.read(address, ReadCall::SigCount, Value::into_uint).await?;
        let cancelled = self.read(address, ReadCall::Cancelled, Value::into_bool).await?;
        let ended = self.read(address, ReadCall::Ended, Value::into_bool).await?;

        let view = AuctionView {
            address,
            beneficiary,
            ttp,
            end_time: Timestamp::from(narrow(end_time, "endTime").map_err(err)?),
            highest_bid: Wei::from(highest_bid),
            highest_bidder,
            sig_count: narrow(sig_count, "sigCount").map_err(err)?,
            cancelled,
            ended,
        };

        if !view.is_consistent() {
            return Err(err(FetchCause::InconsistentState));
        }

        Ok(view)
    }

    /// Refundable balance of `who` in an auction.
    pub async fn funds(&self, address: Identity, who: Identity) -> Result<Wei, FetchError> {
        let n = self
            .read(address, ReadCall::FundsByBidder(who), Value::into_uint)
            .await?;
        Ok(Wei::from(n))
    }

    async fn read<T, F>(&self, address: Identity, call: ReadCall, f: F) -> Result<T, FetchError>
    where
        F: FnOnce(Value) -> Result<T, LedgerError>,
    {
        self.ledger
            .read(address, call)
            .await
            .and_then(f)
            .map_err(|err| {
                let cause = FetchCause::Ledger {
                    method: call.method(),
                    err,
                };
                FetchError::new(address, cause)
            })
    }
}

fn narrow(n: U256, field: &'static str) -> Result<u64, FetchCause> {
    u64::try_from(n).map_err(|_| FetchCause::OutOfRange(field))
}
