use std::time::Duration;

use gavel::{Identity, Refresher};
use tokio::time::{sleep, timeout};

use crate::{ALICE, BOB, CAROL, Market};

#[tokio::test]
async fn refresher_follows_the_ledger() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let snapshots = m.coordinator.snapshots().clone();
    let mut rx = snapshots.subscribe();

    let refresher = Refresher::spawn(
        m.coordinator.synchronizer().clone(),
        snapshots.clone(),
        m.config.refresh_interval(),
    );
    timeout(Duration::from_secs(5), rx.changed()).await.unwrap().unwrap();
    assert_eq!(snapshots.latest().unwrap().len(), 1);

    let b = m.ledger.deploy(BOB, Identity::NULL, 100);
    m.ledger.update(a, |v| v.cancelled = true);
    refresher.trigger();
    timeout(Duration::from_secs(5), rx.changed()).await.unwrap().unwrap();

    let latest = snapshots.latest().unwrap();
    assert_eq!(latest.len(), 2);
    let active = latest.active().map(|v| v.address).collect::<Vec<_>>();
    assert_eq!(active, vec![b]);
}

#[tokio::test]
async fn slow_auction_does_not_block_refresh() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let b = m.ledger.deploy(BOB, CAROL, 100);
    m.ledger.stall_reads(b);

    let snapshots = m.coordinator.snapshots().clone();
    let mut rx = snapshots.subscribe();
    let _refresher = Refresher::spawn(
        m.coordinator.synchronizer().clone(),
        snapshots.clone(),
        m.config.refresh_interval(),
    );

    let bound = m.fetch_timeout() * 20;
    timeout(bound, rx.changed()).await.unwrap().unwrap();
    let latest = snapshots.latest().unwrap();
    assert!(latest.get(a).is_some());
    assert!(latest.get(b).is_none());
}

#[tokio::test]
async fn writes_schedule_a_resync() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    m.coordinator.refresh().await.unwrap();
    let mut rx = m.coordinator.snapshots().subscribe();

    m.coordinator.bid(BOB, a, 5u64.into()).await.unwrap();

    // The re-sync runs in the background; wait until it has been published.
    timeout(Duration::from_secs(5), rx.changed()).await.unwrap().unwrap();
    let latest = m.coordinator.snapshots().latest().unwrap();
    assert_eq!(latest.get(a).unwrap().highest_bidder, BOB);

    // Rejected actions do not.
    let _ = m.coordinator.bid(ALICE, a, 1u64.into()).await.unwrap_err();
    sleep(Duration::from_millis(100)).await;
    assert!(!rx.has_changed().unwrap());
}
