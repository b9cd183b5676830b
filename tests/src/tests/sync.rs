use gavel::{FetchCause, Identity, Phase, SyncError, Timestamp};

use crate::{ALICE, BOB, CAROL, DAVE, Market};

#[tokio::test]
async fn slow_auction_is_dropped_from_snapshot() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let b = m.ledger.deploy(BOB, CAROL, 100);
    m.ledger.stall_reads(b);

    let sync = m.coordinator.synchronizer();
    let (snapshot, failed) = sync.sync_with_report().await.unwrap();

    let listed = snapshot.all().iter().map(|v| v.address).collect::<Vec<_>>();
    assert_eq!(listed, vec![a]);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].address, b);
    assert!(matches!(failed[0].cause, FetchCause::Timeout));
}

#[tokio::test]
async fn missing_contract_is_dropped_from_snapshot() {
    let m = Market::new(1000);
    let ghost = Identity::from_bytes([0x42; 20]);
    m.ledger.register_missing(ghost);
    let a = m.ledger.deploy(ALICE, Identity::NULL, 100);

    let (snapshot, failed) = m
        .coordinator
        .synchronizer()
        .sync_with_report()
        .await
        .unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get(a).is_some());
    assert_eq!(failed[0].address, ghost);
}

#[tokio::test]
async fn registry_failure_is_not_an_empty_list() {
    let m = Market::new(1000);
    m.ledger.deploy(ALICE, CAROL, 100);
    m.ledger.fail_registry(true);
    let r = m.coordinator.synchronizer().sync().await;
    assert!(matches!(r, Err(SyncError::GatewayUnavailable(_))));
    assert!(m.coordinator.snapshots().latest().is_none());
}

#[tokio::test]
async fn repeated_syncs_agree() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    m.ledger.deploy(BOB, Identity::NULL, 5);
    m.ledger.update(a, |v| {
        v.highest_bidder = DAVE;
        v.highest_bid = 9u64.into();
    });

    let sync = m.coordinator.synchronizer();
    let first = sync.sync().await.unwrap();
    let second = sync.sync().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn all_views_judged_at_one_reference() {
    let m = Market::new(1500);
    let a = m.ledger.deploy(ALICE, CAROL, 0);
    m.ledger.update(a, |v| {
        v.end_time = Timestamp::from(1000);
        v.highest_bidder = BOB;
        v.highest_bid = 1u64.into();
    });
    let b = m.ledger.deploy(ALICE, CAROL, 200);

    let snapshot = m.coordinator.refresh().await.unwrap();
    assert_eq!(snapshot.reference(), Timestamp::from(1500));

    let va = snapshot.get(a).unwrap();
    let vb = snapshot.get(b).unwrap();
    assert_eq!(snapshot.status(va, ALICE).time_remaining, -500);
    assert_eq!(snapshot.status(vb, ALICE).time_remaining, 200);
    assert_eq!(va.phase(snapshot.reference()), Phase::BiddingClosed);
    assert_eq!(vb.phase(snapshot.reference()), Phase::Active);

    for who in [ALICE, BOB, CAROL] {
        assert!(snapshot.status(va, who).signable);
    }
    assert!(!snapshot.status(va, DAVE).signable);
    assert!(!snapshot.status(va, Identity::NULL).signable);

    // The ledger moving on does not affect an already taken snapshot.
    m.ledger.advance(1000);
    assert_eq!(snapshot.status(vb, ALICE).time_remaining, 200);
}

#[tokio::test]
async fn active_projection_hides_terminal_auctions() {
    let m = Market::new(1000);
    let a = m.ledger.deploy(ALICE, CAROL, 100);
    let b = m.ledger.deploy(ALICE, CAROL, 100);
    let c = m.ledger.deploy(ALICE, CAROL, 100);
    m.ledger.update(a, |v| v.cancelled = true);
    m.ledger.update(c, |v| {
        v.sig_count = 2;
        v.ended = true
    });

    let snapshot = m.coordinator.refresh().await.unwrap();
    assert_eq!(snapshot.all().len(), 3);
    let active = snapshot.active().map(|v| v.address).collect::<Vec<_>>();
    assert_eq!(active, vec![b]);
    assert_eq!(snapshot.get(a).unwrap().phase(snapshot.reference()), Phase::Cancelled);
    assert_eq!(snapshot.get(c).unwrap().phase(snapshot.reference()), Phase::Ended);
}
