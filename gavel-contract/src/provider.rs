//! Helper functions to build Ethereum [providers](https://docs.rs/alloy/latest/alloy/providers/trait.Provider.html)
//! and the [`Ledger`] implementation backed by them.

use std::{fmt, pin::Pin};

use alloy::{
    eips::BlockNumberOrTag,
    network::{Ethereum, EthereumWallet, ReceiptResponse},
    primitives::{Address, U256},
    providers::{
        PendingTransactionError, Provider, ProviderBuilder, RootProvider,
        fillers::{FillProvider, JoinFill, WalletFiller},
        utils::JoinedRecommendedFillers,
    },
    rpc::types::{Filter, Log},
    signers::local::{LocalSignerError, MnemonicBuilder, PrivateKeySigner, coins_bip39::English},
    sol_types::SolEvent,
    transports::{TransportError, ws::WsConnect},
};
use async_trait::async_trait;
use futures::{Stream, StreamExt, future, stream};
use gavel_types::{Identity, Timestamp, Wei};
use tracing::{debug, error, warn};
use url::Url;

use crate::bindings::{AuctionMaker, SimpleAuction};
use crate::ledger::{
    Activity, Ledger, LedgerError, ReadCall, Receipt, TxParams, Value, WriteCall,
};

/// Provider connected to blockchain URL; transactions are signed by the node.
pub type HttpProvider = FillProvider<JoinedRecommendedFillers, RootProvider, Ethereum>;

/// Provider with recommended fillers and a local wallet.
pub type HttpProviderWithWallet = FillProvider<
    JoinFill<JoinedRecommendedFillers, WalletFiller<EthereumWallet>>,
    RootProvider,
    Ethereum,
>;

pub fn connect(url: Url) -> HttpProvider {
    ProviderBuilder::new().connect_http(url)
}

/// A mnemonic did not yield a signing key.
#[derive(Debug, thiserror::Error)]
#[error("cannot derive account {index} from mnemonic: {source}")]
pub struct WalletError {
    index: u32,
    #[source]
    source: LocalSignerError,
}

/// Derive the key of account `index` (BIP-44, Ethereum path) from a mnemonic.
pub fn derive_signer(mnemonic: &str, index: u32) -> Result<PrivateKeySigner, WalletError> {
    let err = |source| WalletError { index, source };
    MnemonicBuilder::<English>::default()
        .phrase(mnemonic)
        .index(index)
        .map_err(err)?
        .build()
        .map_err(err)
}

/// Connect with a local wallet holding the derived key.
///
/// Returns the provider together with the address it signs for.
pub fn connect_with_wallet(
    url: Url,
    mnemonic: &str,
    index: u32,
) -> Result<(HttpProviderWithWallet, Identity), WalletError> {
    let signer = derive_signer(mnemonic, index)?;
    let account = Identity::from(signer.address());
    let provider = ProviderBuilder::new()
        .wallet(EthereumWallet::from(signer))
        .connect_http(url);
    Ok((provider, account))
}

/// Log subscriptions over a websocket connection.
///
/// Streams handed out stay live only as long as the feed does.
#[derive(Clone)]
pub struct ActivityFeed(HttpProvider);

impl ActivityFeed {
    pub async fn connect(ws_url: Url) -> Result<Self, LedgerError> {
        let provider = ProviderBuilder::new()
            .connect_pubsub_with(WsConnect::new(ws_url))
            .await
            .inspect_err(|err| error!(%err, "activity feed failed to connect"))?;
        Ok(Self(provider))
    }

    /// Auctions created by `registry` and bids on any auction, from the
    /// next block on.
    ///
    /// Bids are matched by event signature only, so contracts outside the
    /// registry may show up too.
    pub async fn subscribe(
        &self,
        registry: Identity,
    ) -> Result<Pin<Box<dyn Stream<Item = Activity> + Send>>, LedgerError> {
        let created = Filter::new()
            .address(Address::from(registry))
            .event_signature(AuctionMaker::AuctionCreated::SIGNATURE_HASH)
            .from_block(BlockNumberOrTag::Latest);
        let bids = Filter::new()
            .event_signature(SimpleAuction::LogBid::SIGNATURE_HASH)
            .from_block(BlockNumberOrTag::Latest);

        let created = self
            .0
            .subscribe_logs(&created)
            .await
            .inspect_err(|err| error!(%err, "AuctionCreated subscription failed"))?
            .into_stream();
        let bids = self
            .0
            .subscribe_logs(&bids)
            .await
            .inspect_err(|err| error!(%err, "LogBid subscription failed"))?
            .into_stream();

        let activity = stream::select(created, bids)
            .filter_map(|log| future::ready(Activity::from_log(&log)));
        Ok(Box::pin(activity))
    }
}

impl fmt::Debug for ActivityFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ActivityFeed")
    }
}

impl Activity {
    /// Decode an `AuctionCreated` or `LogBid` log. Other logs yield `None`.
    pub fn from_log(log: &Log) -> Option<Self> {
        let topic = *log.topic0()?;
        let decoded = if topic == AuctionMaker::AuctionCreated::SIGNATURE_HASH {
            log.log_decode::<AuctionMaker::AuctionCreated>()
                .map(|e| Self::AuctionCreated {
                    auction: e.data().auction.into(),
                    beneficiary: e.data().beneficiary.into(),
                })
        } else if topic == SimpleAuction::LogBid::SIGNATURE_HASH {
            log.log_decode::<SimpleAuction::LogBid>().map(|e| Self::Bid {
                auction: log.address().into(),
                bidder: e.data().bidder.into(),
                amount: Wei::from(e.data().bid),
            })
        } else {
            return None;
        };
        decoded
            .inspect_err(|err| warn!(%topic, %err, "undecodable event log"))
            .ok()
    }
}

/// A [`Ledger`] over any alloy provider.
#[derive(Debug, Clone)]
pub struct ProviderLedger<P> {
    provider: P,
    accounts: Option<Vec<Identity>>,
}

impl<P: Provider> ProviderLedger<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            accounts: None,
        }
    }

    /// Report these accounts instead of asking the node (`eth_accounts`).
    ///
    /// Needed for wallet providers, whose signers the node knows nothing about.
    pub fn with_accounts<I>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = Identity>,
    {
        self.accounts = Some(accounts.into_iter().collect());
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: Provider + 'static> Ledger for ProviderLedger<P> {
    async fn accounts(&self) -> Result<Vec<Identity>, LedgerError> {
        if let Some(a) = &self.accounts {
            return Ok(a.clone());
        }
        let accounts = self.provider.get_accounts().await?;
        Ok(accounts.into_iter().map(Identity::from).collect())
    }

    async fn latest_timestamp(&self) -> Result<Timestamp, LedgerError> {
        let Some(block) = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
        else {
            return Err(LedgerError::Unavailable("no latest block".into()));
        };
        Ok(Timestamp::from(block.header.timestamp))
    }

    async fn balance(&self, who: Identity) -> Result<Wei, LedgerError> {
        let b = self.provider.get_balance(who.into()).await?;
        Ok(Wei::from(b))
    }

    async fn read(&self, contract: Identity, call: ReadCall) -> Result<Value, LedgerError> {
        let addr = Address::from(contract);
        let auction = SimpleAuction::new(addr, &self.provider);
        let value = match call {
            ReadCall::ListAuctions => {
                let registry = AuctionMaker::new(addr, &self.provider);
                let list = registry.getAuction().call().await?;
                Value::Addresses(list.into_iter().map(Identity::from).collect())
            }
            ReadCall::Beneficiary => Value::Address(auction.beneficiary().call().await?.into()),
            ReadCall::Ttp => Value::Address(auction.ttp().call().await?.into()),
            ReadCall::HighestBidder => Value::Address(auction.highestBidder().call().await?.into()),
            ReadCall::HighestBid => Value::Uint(auction.getHighestBid().call().await?),
            ReadCall::EndTime => Value::Uint(auction.auctionEndTime().call().await?),
            ReadCall::SigCount => Value::Uint(auction.sigCount().call().await?),
            ReadCall::Cancelled => Value::Bool(auction.cancelled().call().await?),
            ReadCall::Ended => Value::Bool(auction.ended().call().await?),
            ReadCall::FundsByBidder(who) => {
                Value::Uint(auction.fundsByBidder(who.into()).call().await?)
            }
        };
        Ok(value)
    }

    async fn send(
        &self,
        contract: Identity,
        call: WriteCall,
        params: TxParams,
    ) -> Result<Receipt, LedgerError> {
        let addr = Address::from(contract);
        let from = Address::from(params.from);
        let value = params.value.map(|v| v.get()).unwrap_or_default();
        let auction = SimpleAuction::new(addr, &self.provider);

        let pending = match call {
            WriteCall::CreateAuction { bidding_time, ttp } => {
                AuctionMaker::new(addr, &self.provider)
                    .createAuction(U256::from(bidding_time), ttp.into())
                    .from(from)
                    .send()
                    .await?
            }
            WriteCall::Bid => auction.bid().from(from).value(value).send().await?,
            WriteCall::CancelAuction => auction.cancelAuction().from(from).send().await?,
            WriteCall::Sign => auction.sign().from(from).send().await?,
            WriteCall::End => auction.end().from(from).send().await?,
            WriteCall::Withdraw => auction.withdraw().from(from).send().await?,
        };

        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, %contract, method = %call, "waiting for tx to be mined");

        let receipt = pending.get_receipt().await?;
        if !receipt.status() {
            warn!(%tx_hash, %contract, method = %call, "tx reverted");
            return Err(LedgerError::Reverted(tx_hash));
        }

        let created = receipt
            .inner
            .logs()
            .iter()
            .find_map(|log| log.log_decode::<AuctionMaker::AuctionCreated>().ok())
            .map(|log| Identity::from(log.data().auction));

        Ok(Receipt {
            tx_hash,
            block_number: receipt.block_number,
            created,
        })
    }
}

impl From<TransportError> for LedgerError {
    fn from(err: TransportError) -> Self {
        // JSON-RPC error responses mean the node was reached and refused.
        match err.as_error_resp() {
            Some(payload) => Self::Call(payload.message.to_string()),
            None => Self::Unavailable(err.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for LedgerError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(e) => e.into(),
            other => Self::Call(other.to_string()),
        }
    }
}

impl From<PendingTransactionError> for LedgerError {
    fn from(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(e) => e.into(),
            other => Self::Unavailable(other.to_string()),
        }
    }
}
