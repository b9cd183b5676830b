//! The ledger gateway consumed by the coordination layer.

use std::fmt;

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use gavel_types::{Identity, Timestamp, Wei};

/// Read calls against registry or auction contract state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadCall {
    ListAuctions,
    Beneficiary,
    Ttp,
    HighestBidder,
    HighestBid,
    EndTime,
    SigCount,
    Cancelled,
    Ended,
    FundsByBidder(Identity),
}

impl ReadCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::ListAuctions => "getAuction",
            Self::Beneficiary => "beneficiary",
            Self::Ttp => "ttp",
            Self::HighestBidder => "highestBidder",
            Self::HighestBid => "getHighestBid",
            Self::EndTime => "auctionEndTime",
            Self::SigCount => "sigCount",
            Self::Cancelled => "cancelled",
            Self::Ended => "ended",
            Self::FundsByBidder(_) => "fundsByBidder",
        }
    }
}

impl fmt::Display for ReadCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Ledger events that make earlier snapshots stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    AuctionCreated {
        auction: Identity,
        beneficiary: Identity,
    },
    Bid {
        auction: Identity,
        bidder: Identity,
        amount: Wei,
    },
}

impl Activity {
    /// The auction the event concerns.
    pub fn auction(&self) -> Identity {
        match self {
            Self::AuctionCreated { auction, .. } | Self::Bid { auction, .. } => *auction,
        }
    }
}

/// State-changing calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteCall {
    /// Sent to the registry.
    CreateAuction { bidding_time: u64, ttp: Identity },
    /// Payable; the bid amount travels as the transaction value.
    Bid,
    CancelAuction,
    Sign,
    End,
    Withdraw,
}

impl WriteCall {
    pub fn method(&self) -> &'static str {
        match self {
            Self::CreateAuction { .. } => "createAuction",
            Self::Bid => "bid",
            Self::CancelAuction => "cancelAuction",
            Self::Sign => "sign",
            Self::End => "end",
            Self::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for WriteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// Result of a read call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Address(Identity),
    Addresses(Vec<Identity>),
    Uint(U256),
    Bool(bool),
}

impl Value {
    pub fn into_address(self) -> Result<Identity, LedgerError> {
        match self {
            Self::Address(a) => Ok(a),
            other => Err(LedgerError::unexpected("address", &other)),
        }
    }

    pub fn into_addresses(self) -> Result<Vec<Identity>, LedgerError> {
        match self {
            Self::Addresses(a) => Ok(a),
            other => Err(LedgerError::unexpected("address[]", &other)),
        }
    }

    pub fn into_uint(self) -> Result<U256, LedgerError> {
        match self {
            Self::Uint(n) => Ok(n),
            other => Err(LedgerError::unexpected("uint256", &other)),
        }
    }

    pub fn into_bool(self) -> Result<bool, LedgerError> {
        match self {
            Self::Bool(b) => Ok(b),
            other => Err(LedgerError::unexpected("bool", &other)),
        }
    }
}

/// Sender and attached funds of a write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxParams {
    pub from: Identity,
    pub value: Option<Wei>,
}

impl TxParams {
    pub fn new(from: Identity) -> Self {
        Self { from, value: None }
    }

    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = Some(value);
        self
    }
}

/// What the ledger client reports for a mined write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Address announced by the registry's `AuctionCreated` event, if any.
    pub created: Option<Identity>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("call failed: {0}")]
    Call(String),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("unexpected value: expected {expected}, got {got}")]
    UnexpectedValue { expected: &'static str, got: String },
}

impl LedgerError {
    fn unexpected(expected: &'static str, got: &Value) -> Self {
        Self::UnexpectedValue {
            expected,
            got: format!("{got:?}"),
        }
    }
}

/// Access to the ledger hosting the registry and its auctions.
///
/// Read calls return immediately available contract state. Write calls are
/// signed by `TxParams::from` and resolve once the client reports a receipt.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn accounts(&self) -> Result<Vec<Identity>, LedgerError>;

    async fn latest_timestamp(&self) -> Result<Timestamp, LedgerError>;

    async fn balance(&self, who: Identity) -> Result<Wei, LedgerError>;

    async fn read(&self, contract: Identity, call: ReadCall) -> Result<Value, LedgerError>;

    async fn send(
        &self,
        contract: Identity,
        call: WriteCall,
        params: TxParams,
    ) -> Result<Receipt, LedgerError>;
}
