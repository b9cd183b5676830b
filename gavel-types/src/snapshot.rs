use serde::{Deserialize, Serialize};

use crate::status::{Status, evaluate};
use crate::{AuctionView, Identity, Timestamp};

/// All auctions known at one reference moment.
///
/// Every derived value is computed against `reference`, so no two views of the
/// same snapshot are ever judged against different clock readings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionListSnapshot {
    reference: Timestamp,
    auctions: Vec<AuctionView>,
}

impl AuctionListSnapshot {
    pub fn new(reference: Timestamp, auctions: Vec<AuctionView>) -> Self {
        Self {
            reference,
            auctions,
        }
    }

    pub fn reference(&self) -> Timestamp {
        self.reference
    }

    /// Every fetched auction, terminal ones included.
    pub fn all(&self) -> &[AuctionView] {
        &self.auctions
    }

    /// Auctions that are neither cancelled nor ended.
    pub fn active(&self) -> impl Iterator<Item = &AuctionView> {
        self.auctions.iter().filter(|a| !a.is_terminal())
    }

    pub fn get(&self, address: Identity) -> Option<&AuctionView> {
        self.auctions.iter().find(|a| a.address == address)
    }

    pub fn status(&self, view: &AuctionView, caller: Identity) -> Status {
        evaluate(view, self.reference, caller)
    }

    pub fn len(&self) -> usize {
        self.auctions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.is_empty()
    }
}
