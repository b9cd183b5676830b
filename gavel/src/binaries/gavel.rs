use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use alloy::providers::Provider;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use gavel::logging::init_logging;
use gavel::{
    AuctionListSnapshot, AuctionView, Coordinator, CurrentAccount, FetchError, Identity, Phase,
    Refresher, Wei, WithdrawReport,
};
use gavel_config::GavelConfig;
use futures::Stream;
use gavel_contract::provider::{connect, connect_with_wallet};
use gavel_contract::{Activity, ActivityFeed, Ledger, ProviderLedger, Receipt};
use tracing::{info, warn};
use url::Url;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[clap(long, short, env = "GAVEL_CONFIG", default_value = "gavel.toml")]
    config: PathBuf,

    /// Act as this account instead of the first one the ledger reports.
    #[clap(long, short)]
    account: Option<Identity>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the available accounts and their balances.
    Accounts,

    /// Show the auctions of the registry.
    List {
        /// Include cancelled and ended auctions.
        #[clap(long)]
        all: bool,
    },

    /// Start a new auction with the current account as beneficiary.
    Create {
        /// Bidding period in seconds.
        #[clap(long)]
        bidding_time: u64,

        /// Trusted third party allowed to sign.
        #[clap(long)]
        ttp: Option<Identity>,
    },

    /// Place a bid.
    Bid {
        #[clap(long)]
        auction: Identity,

        /// Amount in ether, e.g. `0.5`.
        #[clap(long)]
        amount: String,
    },

    Cancel {
        #[clap(long)]
        auction: Identity,
    },

    Sign {
        #[clap(long)]
        auction: Identity,
    },

    End {
        #[clap(long)]
        auction: Identity,
    },

    /// Withdraw refundable funds from every auction.
    Withdraw,

    /// Keep refreshing and print every new snapshot until interrupted.
    Watch {
        #[clap(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let cfg = GavelConfig::read(&cli.config)
        .await
        .with_context(|| format!("could not read config {:?}", cli.config))?;

    let url = cfg.chain.rpc_url.clone();

    if let Some(w) = &cfg.wallet {
        let (provider, signer) = connect_with_wallet(url, &w.mnemonic, w.account_index)?;
        check_chain(&provider, cfg.chain.id).await?;
        let ledger = ProviderLedger::new(provider).with_accounts([signer]);
        run(cli, cfg, ledger).await
    } else {
        let provider = connect(url);
        check_chain(&provider, cfg.chain.id).await?;
        run(cli, cfg, ProviderLedger::new(provider)).await
    }
}

async fn check_chain<P: Provider>(provider: &P, expected: Option<u64>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = provider
        .get_chain_id()
        .await
        .context("failed to query chain id")?;
    if actual != expected {
        bail!("connected to chain {actual}, but config expects chain {expected}")
    }
    Ok(())
}

async fn run<L: Ledger + 'static>(cli: Cli, cfg: GavelConfig, ledger: L) -> Result<()> {
    let ledger = Arc::new(ledger);
    let timeout = cfg.sync.fetch_timeout();
    let coordinator = Coordinator::new(ledger.clone(), cfg.chain.registry, timeout);

    let account = CurrentAccount::new();
    if let Some(a) = cli.account {
        account.set(a)
    }
    account
        .select_default(&*ledger)
        .await
        .context("failed to list accounts")?;

    match cli.command {
        Command::Accounts => {
            let current = account.get();
            for a in ledger.accounts().await.context("failed to list accounts")? {
                let balance = ledger.balance(a).await.context("failed to query balance")?;
                let marker = if Some(a) == current { "*" } else { " " };
                println!("{marker} {a}  {} ETH", balance.to_ether_string());
            }
        }
        Command::List { all } => {
            let caller = account.get().unwrap_or(Identity::NULL);
            if caller.is_null() {
                let snapshot = coordinator.refresh().await?;
                render(&snapshot, caller, all, &Holdings::new());
            } else {
                // Syncs and publishes the snapshot it read the balances against.
                let (balances, unreadable) = coordinator.refundable(caller).await?;
                let snapshot = coordinator.snapshot().await?;
                render(&snapshot, caller, all, &holdings(balances, &unreadable));
                for err in &unreadable {
                    eprintln!("{}: balance unknown: {err}", err.address)
                }
            }
        }
        Command::Create { bidding_time, ttp } => {
            let caller = caller(&account)?;
            let ttp = ttp.unwrap_or(Identity::NULL);
            let receipt = coordinator.create_auction(caller, bidding_time, ttp).await?;
            print_receipt(&receipt);
            if let Some(a) = receipt.created {
                println!("auction {a}");
            }
        }
        Command::Bid { auction, amount } => {
            let caller = caller(&account)?;
            let amount = Wei::parse_ether(&amount)
                .with_context(|| format!("invalid ether amount {amount:?}"))?;
            print_receipt(&coordinator.bid(caller, auction, amount).await?);
        }
        Command::Cancel { auction } => {
            let caller = caller(&account)?;
            print_receipt(&coordinator.cancel_auction(caller, auction).await?);
        }
        Command::Sign { auction } => {
            let caller = caller(&account)?;
            print_receipt(&coordinator.sign_auction(caller, auction).await?);
        }
        Command::End { auction } => {
            let caller = caller(&account)?;
            print_receipt(&coordinator.end_auction(caller, auction).await?);
        }
        Command::Withdraw => {
            let caller = caller(&account)?;
            let report = coordinator.withdraw(caller).await?;
            print_withdrawals(&report);
            if !report.is_complete() {
                bail!("some withdrawals did not go through")
            }
        }
        Command::Watch { all } => {
            let caller = account.get().unwrap_or(Identity::NULL);
            let period = cfg.sync.refresh_interval();
            let mut refresher = Refresher::spawn(
                coordinator.synchronizer().clone(),
                coordinator.snapshots().clone(),
                period,
            );
            // Kept alive for as long as the subscriptions are followed.
            let mut feed = None;
            if let Some(ws) = &cfg.chain.ws_url {
                match subscribe(ws.clone(), cfg.chain.registry).await {
                    Ok((f, events)) => {
                        refresher.follow(events);
                        feed = Some(f)
                    }
                    Err(err) => warn!(%err, "no event subscription, refreshing periodically"),
                }
            }
            info!(?period, events = feed.is_some(), "watching auctions");
            let mut rx = coordinator.snapshots().subscribe();
            let ctrl_c = tokio::signal::ctrl_c();
            tokio::pin!(ctrl_c);
            loop {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break
                        }
                        let latest = rx.borrow_and_update().clone();
                        if let Some(s) = latest {
                            render(&s, caller, all, &Holdings::new());
                            println!();
                        }
                    }
                    _ = &mut ctrl_c => break,
                }
            }
            drop(refresher);
            drop(feed)
        }
    }

    Ok(())
}

async fn subscribe(
    ws_url: Url,
    registry: Identity,
) -> Result<(ActivityFeed, impl Stream<Item = Activity> + Send + 'static)> {
    let feed = ActivityFeed::connect(ws_url).await?;
    let events = feed.subscribe(registry).await?;
    Ok((feed, events))
}

fn caller(account: &CurrentAccount) -> Result<Identity> {
    account
        .get()
        .context("no account available, pass --account or configure a wallet")
}

/// Refundable balance per auction; `None` if it could not be read.
type Holdings = HashMap<Identity, Option<Wei>>;

fn holdings(balances: Vec<(Identity, Wei)>, unreadable: &[FetchError]) -> Holdings {
    let mut h = Holdings::new();
    for err in unreadable {
        h.insert(err.address, None);
    }
    for (a, amount) in balances {
        h.insert(a, Some(amount));
    }
    h
}

fn yours(holdings: &Holdings, auction: Identity) -> String {
    match holdings.get(&auction) {
        Some(Some(amount)) => amount.to_ether_string(),
        Some(None) => "unknown".to_string(),
        None => "-".to_string(),
    }
}

fn render(snapshot: &AuctionListSnapshot, caller: Identity, all: bool, holdings: &Holdings) {
    println!("reference time: {}", snapshot.reference());
    println!(
        "{:<42}  {:<14}  {:>10}  {:>20}  {:<42}  {:>4}  {:>20}  actions",
        "auction", "phase", "remaining", "highest bid (ETH)", "highest bidder", "sigs", "yours (ETH)"
    );

    let views: Box<dyn Iterator<Item = &AuctionView>> = if all {
        Box::new(snapshot.all().iter())
    } else {
        Box::new(snapshot.active())
    };

    for v in views {
        let status = snapshot.status(v, caller);
        let phase = Phase::of(v, snapshot.reference());
        let remaining = if phase == Phase::Active {
            format!("{}s", status.time_remaining)
        } else {
            "-".to_string()
        };
        let funds = yours(holdings, v.address);

        let mut actions = Vec::new();
        if status.biddable {
            actions.push("bid")
        }
        if status.cancelable && caller == v.beneficiary && !v.is_terminal() {
            actions.push("cancel")
        }
        if status.signable {
            actions.push("sign")
        }
        if status.endable && !v.is_terminal() {
            actions.push("end")
        }

        println!(
            "{:<42}  {:<14}  {:>10}  {:>20}  {:<42}  {:>4}  {:>20}  {}",
            v.address.to_string(),
            phase.to_string(),
            remaining,
            v.highest_bid.to_ether_string(),
            v.highest_bidder.to_string(),
            v.sig_count,
            funds,
            actions.join(",")
        );
    }
}

fn print_receipt(r: &Receipt) {
    match r.block_number {
        Some(n) => println!("transaction {} in block {n}", r.tx_hash),
        None => println!("transaction {}", r.tx_hash),
    }
}

fn print_withdrawals(report: &WithdrawReport) {
    for w in &report.withdrawals {
        match &w.result {
            Ok(r) => println!(
                "{}: withdrew {} ETH ({})",
                w.auction,
                w.amount.to_ether_string(),
                r.tx_hash
            ),
            Err(err) => println!("{}: failed: {err}", w.auction),
        }
    }
    for err in &report.unreadable {
        println!("{}: balance unknown: {err}", err.address)
    }
}
