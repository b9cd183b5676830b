use std::fmt;

use gavel_contract::LedgerError;
use gavel_types::Identity;

/// A sync cycle could not produce a snapshot at all.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SyncError {
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(#[source] LedgerError),
}

/// One auction could not be fetched. Never fatal to a sync cycle.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to fetch auction {address}: {cause}")]
pub struct FetchError {
    pub address: Identity,
    #[source]
    pub cause: FetchCause,
}

impl FetchError {
    pub fn new(address: Identity, cause: FetchCause) -> Self {
        Self { address, cause }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchCause {
    #[error("read call {method} failed: {err}")]
    Ledger {
        method: &'static str,
        #[source]
        err: LedgerError,
    },

    #[error("no response within the fetch timeout")]
    Timeout,

    #[error("auction reports both cancelled and ended")]
    InconsistentState,

    #[error("{0} does not fit into 64 bits")]
    OutOfRange(&'static str),
}

/// Why an action was refused before anything was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownAuction(Identity),
    ZeroBiddingTime,
    ZeroAmount,
    NotBiddable(Identity),
    NotCancelable(Identity),
    NotBeneficiary(Identity),
    NotSignable(Identity),
    NotEndable(Identity),
    NothingToWithdraw,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAuction(a) => write!(f, "auction {a} is not in the latest snapshot"),
            Self::ZeroBiddingTime => f.write_str("bidding time must be positive"),
            Self::ZeroAmount => f.write_str("bid amount must be positive"),
            Self::NotBiddable(a) => write!(f, "auction {a} does not accept bids from caller"),
            Self::NotCancelable(a) => write!(f, "auction {a} can no longer be cancelled"),
            Self::NotBeneficiary(a) => write!(f, "only the beneficiary may cancel auction {a}"),
            Self::NotSignable(a) => write!(f, "caller may not sign auction {a}"),
            Self::NotEndable(a) => write!(f, "auction {a} lacks a signature quorum"),
            Self::NothingToWithdraw => f.write_str("no refundable balance in any auction"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ActionError {
    /// A local precondition failed; no transaction was submitted.
    ///
    /// The underlying state may have changed, so re-sync before retrying.
    #[error("action rejected: {0}")]
    Rejected(Rejection),

    /// The ledger rejected or reverted the submitted transaction.
    #[error("transaction failed: {0}")]
    TransactionFailed(#[source] LedgerError),

    /// No snapshot was available to evaluate the guards against.
    #[error("gateway unavailable: {0}")]
    GatewayUnavailable(#[source] LedgerError),
}

impl ActionError {
    pub fn rejection(&self) -> Option<Rejection> {
        if let Self::Rejected(r) = self {
            Some(*r)
        } else {
            None
        }
    }
}

impl From<Rejection> for ActionError {
    fn from(r: Rejection) -> Self {
        Self::Rejected(r)
    }
}

impl From<SyncError> for ActionError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::GatewayUnavailable(e) => Self::GatewayUnavailable(e),
        }
    }
}
