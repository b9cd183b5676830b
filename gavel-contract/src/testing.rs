//! An in-memory ledger hosting one registry and its auctions.
//!
//! The contract rules mirror the Solidity auctions closely enough to drive the
//! coordination layer end-to-end. Faults can be injected per address.

use std::collections::{HashMap, HashSet};
use std::future::pending;

use alloy::primitives::{TxHash, U256};
use async_trait::async_trait;
use gavel_types::{AuctionView, Identity, Timestamp, Wei};
use parking_lot::Mutex;

use crate::ledger::{Ledger, LedgerError, ReadCall, Receipt, TxParams, Value, WriteCall};

/// Starting balance of every account: 100 ether.
const INITIAL_BALANCE: u128 = 100_000_000_000_000_000_000;

/// A write call as it was submitted, whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub contract: Identity,
    pub call: WriteCall,
    pub params: TxParams,
}

#[derive(Debug)]
pub struct MemoryLedger {
    registry: Identity,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    now: Timestamp,
    block: u64,
    accounts: Vec<Identity>,
    balances: HashMap<Identity, U256>,
    order: Vec<Identity>,
    contracts: HashMap<Identity, Contract>,
    faults: Faults,
    sent: Vec<Sent>,
    reads: usize,
}

#[derive(Debug)]
struct Contract {
    view: AuctionView,
    funds: HashMap<Identity, U256>,
    signers: HashSet<Identity>,
}

#[derive(Debug, Default)]
struct Faults {
    registry: bool,
    registry_stall: bool,
    timestamp: bool,
    timestamp_stall: bool,
    sends: bool,
    reads: HashSet<Identity>,
    stalls: HashSet<Identity>,
    withdraws: HashSet<Identity>,
}

impl MemoryLedger {
    pub fn new<A>(registry: Identity, accounts: A, now: Timestamp) -> Self
    where
        A: IntoIterator<Item = Identity>,
    {
        let accounts = accounts.into_iter().collect::<Vec<_>>();
        let balances = accounts
            .iter()
            .map(|a| (*a, U256::from(INITIAL_BALANCE)))
            .collect();
        Self {
            registry,
            state: Mutex::new(State {
                now,
                accounts,
                balances,
                ..State::default()
            }),
        }
    }

    pub fn registry(&self) -> Identity {
        self.registry
    }

    pub fn now(&self) -> Timestamp {
        self.state.lock().now
    }

    pub fn set_time(&self, t: Timestamp) {
        self.state.lock().now = t
    }

    pub fn advance(&self, secs: u64) {
        let mut st = self.state.lock();
        st.now = st.now + secs
    }

    /// Create an auction directly, without a transaction.
    pub fn deploy(&self, beneficiary: Identity, ttp: Identity, bidding_time: u64) -> Identity {
        self.state.lock().create(beneficiary, ttp, bidding_time)
    }

    /// Current on-ledger state of an auction.
    pub fn view(&self, auction: Identity) -> Option<AuctionView> {
        self.state
            .lock()
            .contracts
            .get(&auction)
            .map(|c| c.view.clone())
    }

    /// Overwrite raw auction fields, e.g. to stage a signature count.
    pub fn update<F>(&self, auction: Identity, f: F)
    where
        F: FnOnce(&mut AuctionView),
    {
        if let Some(c) = self.state.lock().contracts.get_mut(&auction) {
            f(&mut c.view)
        }
    }

    pub fn set_funds(&self, auction: Identity, who: Identity, amount: Wei) {
        if let Some(c) = self.state.lock().contracts.get_mut(&auction) {
            c.funds.insert(who, amount.get());
        }
    }

    pub fn funds(&self, auction: Identity, who: Identity) -> Wei {
        self.state
            .lock()
            .contracts
            .get(&auction)
            .and_then(|c| c.funds.get(&who).copied())
            .map(Wei::from)
            .unwrap_or_default()
    }

    /// Register an address with the registry that has no contract behind it.
    pub fn register_missing(&self, address: Identity) {
        self.state.lock().order.push(address)
    }

    pub fn fail_registry(&self, on: bool) {
        self.state.lock().faults.registry = on
    }

    pub fn fail_timestamp(&self, on: bool) {
        self.state.lock().faults.timestamp = on
    }

    /// Listing the registry never completes.
    pub fn stall_registry(&self, on: bool) {
        self.state.lock().faults.registry_stall = on
    }

    /// Querying the latest block never completes.
    pub fn stall_timestamp(&self, on: bool) {
        self.state.lock().faults.timestamp_stall = on
    }

    pub fn fail_sends(&self, on: bool) {
        self.state.lock().faults.sends = on
    }

    /// Every read call against `auction` fails.
    pub fn fail_reads(&self, auction: Identity) {
        self.state.lock().faults.reads.insert(auction);
    }

    /// Every read call against `auction` never completes.
    pub fn stall_reads(&self, auction: Identity) {
        self.state.lock().faults.stalls.insert(auction);
    }

    /// `withdraw()` on `auction` reverts.
    pub fn fail_withdraw(&self, auction: Identity) {
        self.state.lock().faults.withdraws.insert(auction);
    }

    pub fn heal(&self) {
        self.state.lock().faults = Faults::default()
    }

    /// All submitted write calls, in submission order.
    pub fn sent(&self) -> Vec<Sent> {
        self.state.lock().sent.clone()
    }

    /// Number of read calls served so far.
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }
}

impl State {
    fn create(&mut self, beneficiary: Identity, ttp: Identity, bidding_time: u64) -> Identity {
        let n = self.order.len() as u64 + 1;
        let mut bytes = [0xac; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        let address = Identity::from(bytes);
        let view = AuctionView {
            address,
            beneficiary,
            ttp,
            end_time: self.now + bidding_time,
            highest_bid: Wei::ZERO,
            highest_bidder: Identity::NULL,
            sig_count: 0,
            cancelled: false,
            ended: false,
        };
        self.contracts.insert(
            address,
            Contract {
                view,
                funds: HashMap::new(),
                signers: HashSet::new(),
            },
        );
        self.order.push(address);
        address
    }

    fn apply(
        &mut self,
        registry: Identity,
        contract: Identity,
        call: WriteCall,
        params: TxParams,
    ) -> Result<Option<Identity>, String> {
        let from = params.from;
        let value = params.value.map(|v| v.get()).unwrap_or_default();
        let now = self.now;

        if let WriteCall::CreateAuction { bidding_time, ttp } = call {
            if contract != registry {
                return Err(format!("{contract} is not the registry"));
            }
            return Ok(Some(self.create(from, ttp, bidding_time)));
        }

        let balance = self.balances.get(&from).copied().unwrap_or_default();
        if balance < value {
            return Err("insufficient funds".into());
        }

        let withdraw_fault = self.faults.withdraws.contains(&contract);
        let Some(c) = self.contracts.get_mut(&contract) else {
            return Err(format!("no contract at {contract}"));
        };
        let v = &mut c.view;

        match call {
            WriteCall::CreateAuction { .. } => {
                return Err("auction has no method createAuction".into());
            }
            WriteCall::Bid => {
                if v.cancelled || v.ended || now.remaining_until(v.end_time) <= 0 {
                    return Err("auction closed".into());
                }
                if from == v.beneficiary || from == v.ttp {
                    return Err("party may not bid".into());
                }
                let total = c.funds.get(&from).copied().unwrap_or_default() + value;
                if value.is_zero() || total <= v.highest_bid.get() {
                    return Err("bid too low".into());
                }
                c.funds.insert(from, total);
                v.highest_bid = Wei::from(total);
                v.highest_bidder = from;
                self.balances.insert(from, balance - value);
            }
            WriteCall::CancelAuction => {
                if from != v.beneficiary || v.cancelled || v.ended || v.sig_count > 0 {
                    return Err("cannot cancel".into());
                }
                v.cancelled = true;
            }
            WriteCall::Sign => {
                let eligible = !from.is_null()
                    && (from == v.beneficiary || from == v.highest_bidder || from == v.ttp);
                if !eligible || v.ended || now.remaining_until(v.end_time) > 0 {
                    return Err("cannot sign".into());
                }
                if !c.signers.insert(from) {
                    return Err("already signed".into());
                }
                v.sig_count += 1;
            }
            WriteCall::End => {
                if v.sig_count < gavel_types::QUORUM || v.ended || v.cancelled {
                    return Err("cannot end".into());
                }
                v.ended = true;
                let price = v.highest_bid.get();
                if !v.highest_bidder.is_null() {
                    let paid = c.funds.entry(v.highest_bidder).or_default();
                    *paid = paid.saturating_sub(price);
                    *c.funds.entry(v.beneficiary).or_default() += price;
                }
            }
            WriteCall::Withdraw => {
                if withdraw_fault {
                    return Err("withdraw reverted".into());
                }
                let held = c.funds.get(&from).copied().unwrap_or_default();
                let locked = if from == v.highest_bidder && !v.is_terminal() {
                    v.highest_bid.get()
                } else {
                    U256::ZERO
                };
                let amount = held.saturating_sub(locked);
                if amount.is_zero() {
                    return Err("nothing to withdraw".into());
                }
                c.funds.insert(from, held - amount);
                *self.balances.entry(from).or_default() += amount;
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn accounts(&self) -> Result<Vec<Identity>, LedgerError> {
        Ok(self.state.lock().accounts.clone())
    }

    async fn latest_timestamp(&self) -> Result<Timestamp, LedgerError> {
        let stalled = self.state.lock().faults.timestamp_stall;
        if stalled {
            pending::<()>().await
        }
        let st = self.state.lock();
        if st.faults.timestamp {
            return Err(LedgerError::Unavailable("node unreachable".into()));
        }
        Ok(st.now)
    }

    async fn balance(&self, who: Identity) -> Result<Wei, LedgerError> {
        let st = self.state.lock();
        Ok(st.balances.get(&who).copied().map(Wei::from).unwrap_or_default())
    }

    async fn read(&self, contract: Identity, call: ReadCall) -> Result<Value, LedgerError> {
        let stalled = {
            let st = self.state.lock();
            st.faults.stalls.contains(&contract)
                || (contract == self.registry && st.faults.registry_stall)
        };
        if stalled {
            pending::<()>().await
        }

        let mut st = self.state.lock();
        st.reads += 1;

        if contract == self.registry {
            return match call {
                ReadCall::ListAuctions if st.faults.registry => {
                    Err(LedgerError::Unavailable("registry unreachable".into()))
                }
                ReadCall::ListAuctions => Ok(Value::Addresses(st.order.clone())),
                other => Err(LedgerError::Call(format!("registry has no method {other}"))),
            };
        }

        if st.faults.reads.contains(&contract) {
            return Err(LedgerError::Unavailable(format!("read {call} of {contract}")));
        }

        let Some(c) = st.contracts.get(&contract) else {
            return Err(LedgerError::Call(format!("no contract at {contract}")));
        };
        let v = &c.view;

        let value = match call {
            ReadCall::ListAuctions => {
                return Err(LedgerError::Call(format!("auction has no method {call}")));
            }
            ReadCall::Beneficiary => Value::Address(v.beneficiary),
            ReadCall::Ttp => Value::Address(v.ttp),
            ReadCall::HighestBidder => Value::Address(v.highest_bidder),
            ReadCall::HighestBid => Value::Uint(v.highest_bid.get()),
            ReadCall::EndTime => Value::Uint(U256::from(u64::from(v.end_time))),
            ReadCall::SigCount => Value::Uint(U256::from(v.sig_count)),
            ReadCall::Cancelled => Value::Bool(v.cancelled),
            ReadCall::Ended => Value::Bool(v.ended),
            ReadCall::FundsByBidder(who) => {
                Value::Uint(c.funds.get(&who).copied().unwrap_or_default())
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
        let mut st = self.state.lock();
        st.sent.push(Sent {
            contract,
            call,
            params,
        });
        if st.faults.sends {
            return Err(LedgerError::Unavailable("node unreachable".into()));
        }
        st.block += 1;
        let mut h = [0u8; 32];
        h[24..].copy_from_slice(&st.block.to_be_bytes());
        let tx_hash = TxHash::from(h);

        match st.apply(self.registry, contract, call, params) {
            Ok(created) => Ok(Receipt {
                tx_hash,
                block_number: Some(st.block),
                created,
            }),
            Err(reason) => Err(LedgerError::Call(format!("execution reverted: {reason}"))),
        }
    }
}
