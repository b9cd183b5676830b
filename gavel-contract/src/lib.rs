//! Auction contract bindings and the ledger gateway.
//!
//! [`Ledger`] is the only interface the coordination layer talks to. It is
//! implemented over alloy providers by [`ProviderLedger`] and, for tests, by
//! the in-memory [`testing::MemoryLedger`].

mod bindings;
mod ledger;

pub mod provider;

#[cfg(any(test, feature = "test"))]
pub mod testing;

pub use bindings::{AuctionMaker, SimpleAuction};
pub use ledger::{Activity, Ledger, LedgerError, ReadCall, Receipt, TxParams, Value, WriteCall};
pub use provider::{ActivityFeed, ProviderLedger};
