use gavel::{ActionError, CurrentAccount, Identity, Rejection, Wei};
use gavel_contract::WriteCall;

use crate::{ALICE, BOB, CAROL, DAVE, Market};

fn ether(s: &str) -> Wei {
    Wei::parse_ether(s).unwrap()
}

#[tokio::test]
async fn auction_lifecycle() {
    let m = Market::new(10_000);
    let c = &m.coordinator;

    let a = c
        .create_auction(ALICE, 60, CAROL)
        .await
        .unwrap()
        .created
        .unwrap();
    c.refresh().await.unwrap();

    c.bid(BOB, a, ether("1")).await.unwrap();
    c.bid(DAVE, a, ether("2")).await.unwrap();
    c.refresh().await.unwrap();
    let e = c.sign_auction(ALICE, a).await.unwrap_err();
    assert_eq!(e.rejection(), Some(Rejection::NotSignable(a)));

    m.ledger.advance(60);
    c.refresh().await.unwrap();
    let e = c.bid(BOB, a, ether("5")).await.unwrap_err();
    assert_eq!(e.rejection(), Some(Rejection::NotBiddable(a)));

    c.sign_auction(DAVE, a).await.unwrap();
    c.sign_auction(CAROL, a).await.unwrap();
    c.refresh().await.unwrap();
    let e = c.cancel_auction(ALICE, a).await.unwrap_err();
    assert_eq!(e.rejection(), Some(Rejection::NotCancelable(a)));
    c.end_auction(ALICE, a).await.unwrap();

    let snapshot = c.refresh().await.unwrap();
    assert!(snapshot.active().next().is_none());
    let v = snapshot.get(a).unwrap();
    assert!(v.ended);
    assert_eq!(v.highest_bidder, DAVE);
    assert_eq!(v.highest_bid, ether("2"));

    // The outbid bidder and the beneficiary can both collect.
    let report = c.withdraw(BOB).await.unwrap();
    assert!(report.is_complete());
    assert_eq!(report.withdrawals[0].amount, ether("1"));
    let report = c.withdraw(ALICE).await.unwrap();
    assert_eq!(report.withdrawals[0].amount, ether("2"));
    let e = c.withdraw(DAVE).await.unwrap_err();
    assert_eq!(e.rejection(), Some(Rejection::NothingToWithdraw));
}

#[tokio::test]
async fn beneficiary_cannot_bid_on_own_auction() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let snapshot = m.coordinator.refresh().await.unwrap();
    assert!(!snapshot.status(snapshot.get(a).unwrap(), ALICE).biddable);

    let e = m.coordinator.bid(ALICE, a, ether("1")).await.unwrap_err();
    assert!(matches!(e, ActionError::Rejected(Rejection::NotBiddable(x)) if x == a));
    assert!(m.ledger.sent().is_empty());
}

#[tokio::test]
async fn cancel_before_any_signature() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, Identity::NULL, 100);
    m.coordinator.bid(BOB, a, ether("1")).await.unwrap();
    m.coordinator.refresh().await.unwrap();
    m.coordinator.cancel_auction(ALICE, a).await.unwrap();

    let snapshot = m.coordinator.refresh().await.unwrap();
    assert!(snapshot.get(a).unwrap().cancelled);
    assert!(!snapshot.status(snapshot.get(a).unwrap(), DAVE).biddable);

    // Bids on a cancelled auction are fully refundable.
    let report = m.coordinator.withdraw(BOB).await.unwrap();
    assert_eq!(report.succeeded().count(), 1);
    assert_eq!(m.ledger.funds(a, BOB), Wei::ZERO);
}

#[tokio::test]
async fn withdraw_continues_past_failures() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let b = m.ledger.deploy(ALICE, CAROL, 100);
    let c = m.ledger.deploy(DAVE, CAROL, 100);
    for x in [a, b, c] {
        m.ledger.set_funds(x, BOB, ether("1"));
    }
    m.ledger.fail_withdraw(b);

    let report = m.coordinator.withdraw(BOB).await.unwrap();
    let ok = report.succeeded().map(|w| w.auction).collect::<Vec<_>>();
    let failed = report.failed().map(|w| w.auction).collect::<Vec<_>>();
    assert_eq!(ok, vec![a, c]);
    assert_eq!(failed, vec![b]);
    assert!(matches!(
        report.withdrawals[1].result,
        Err(ActionError::TransactionFailed(_))
    ));

    let order = m
        .ledger
        .sent()
        .into_iter()
        .filter(|s| s.call == WriteCall::Withdraw)
        .map(|s| s.contract)
        .collect::<Vec<_>>();
    assert_eq!(order, vec![a, b, c]);
}

#[tokio::test]
async fn unreadable_balance_is_reported() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let b = m.ledger.deploy(ALICE, CAROL, 100);
    m.ledger.set_funds(a, BOB, ether("1"));
    m.coordinator.refresh().await.unwrap();
    m.ledger.fail_reads(b);

    let report = m.coordinator.withdraw(BOB).await.unwrap();
    assert_eq!(report.succeeded().count(), 1);
    assert_eq!(report.unreadable.len(), 1);
    assert_eq!(report.unreadable[0].address, b);
    assert!(!report.is_complete());
}

#[tokio::test]
async fn ledger_revert_is_a_transaction_failure() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    m.ledger.update(a, |v| {
        v.highest_bidder = DAVE;
        v.highest_bid = ether("3");
    });
    // Locally valid, but does not beat the leading bid.
    let e = m.coordinator.bid(BOB, a, ether("1")).await.unwrap_err();
    assert!(matches!(e, ActionError::TransactionFailed(_)));
    assert_eq!(m.ledger.sent().len(), 1);
}

#[tokio::test]
async fn stale_snapshot_rejects_until_refreshed() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 10);
    m.coordinator.refresh().await.unwrap();

    m.ledger.advance(10);
    let e = m.coordinator.sign_auction(ALICE, a).await.unwrap_err();
    assert_eq!(e.rejection(), Some(Rejection::NotSignable(a)));

    m.coordinator.refresh().await.unwrap();
    m.coordinator.sign_auction(ALICE, a).await.unwrap();
}

#[tokio::test]
async fn caller_is_captured_once_per_action() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let account = CurrentAccount::new();
    account.select_default(&*m.ledger).await.unwrap();
    assert_eq!(account.get(), Some(ALICE));

    account.set(BOB);
    let caller = account.get().unwrap();
    let bid = m.coordinator.bid(caller, a, ether("1"));
    account.set(ALICE);
    bid.await.unwrap();

    let sent = m.ledger.sent();
    assert_eq!(sent[0].params.from, BOB);
    assert_eq!(m.ledger.view(a).unwrap().highest_bidder, BOB);
}
