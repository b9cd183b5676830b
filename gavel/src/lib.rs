//! Off-ledger coordination for quorum-closed auctions.
//!
//! The [`Synchronizer`] assembles a time-consistent [`AuctionListSnapshot`]
//! from the registry and the individual auction contracts, and the
//! [`Coordinator`] validates user actions against the latest snapshot before
//! submitting them to the ledger.

mod account;
mod coordinator;
mod error;
mod fetcher;
mod refresh;
mod registry;
mod sync;

pub mod logging;

pub use account::CurrentAccount;
pub use coordinator::{Coordinator, WithdrawReport, Withdrawal};
pub use error::{ActionError, FetchCause, FetchError, Rejection, SyncError};
pub use fetcher::StateFetcher;
pub use refresh::Refresher;
pub use registry::RegistryClient;
pub use sync::{Snapshots, Synchronizer};

pub use gavel_types::{AuctionListSnapshot, AuctionView, Identity, Phase, Status, Timestamp, Wei};
