use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Identity, Timestamp, Wei};

/// The state of one auction contract as read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionView {
    pub address: Identity,
    pub beneficiary: Identity,
    /// Trusted third party; `Identity::NULL` if no arbiter was configured.
    pub ttp: Identity,
    pub end_time: Timestamp,
    pub highest_bid: Wei,
    pub highest_bidder: Identity,
    pub sig_count: u64,
    pub cancelled: bool,
    pub ended: bool,
}

impl AuctionView {
    /// Cancelled or ended. Terminal auctions accept no further bids.
    pub fn is_terminal(&self) -> bool {
        self.cancelled || self.ended
    }

    /// Is this view admissible, i.e. not both cancelled and ended?
    pub fn is_consistent(&self) -> bool {
        !(self.cancelled && self.ended)
    }

    pub fn phase(&self, reference: Timestamp) -> Phase {
        Phase::of(self, reference)
    }
}

/// Presentation label of an auction relative to a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Active,
    BiddingClosed,
    Cancelled,
    Ended,
}

impl Phase {
    pub fn of(view: &AuctionView, reference: Timestamp) -> Self {
        if view.cancelled {
            Self::Cancelled
        } else if view.ended {
            Self::Ended
        } else if reference.remaining_until(view.end_time) <= 0 {
            Self::BiddingClosed
        } else {
            Self::Active
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("running"),
            Self::BiddingClosed => f.write_str("bidding closed"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Ended => f.write_str("ended"),
        }
    }
}
