use std::time::Duration;

use crate::{ALICE, BOB, Market};

const CONFIG: &str = r#"
    [chain]
    rpc-url = "http://localhost:8545"
    registry = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"

    [sync]
    fetch-timeout-ms = 150
"#;

#[tokio::test]
async fn configured_timeout_bounds_fetches() {
    let m = Market::from_toml(1000, CONFIG);
    assert_eq!(m.fetch_timeout(), Duration::from_millis(150));
    assert_eq!(m.config.refresh_interval(), Duration::from_secs(15));

    let a = m.ledger.deploy(ALICE, BOB, 10);
    let b = m.ledger.deploy(BOB, ALICE, 10);
    m.ledger.stall_reads(a);

    let (snapshot, failed) = tokio::time::timeout(
        Duration::from_secs(5),
        m.coordinator.synchronizer().sync_with_report(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(snapshot.len(), 1);
    assert!(snapshot.get(b).is_some());
    assert_eq!(failed[0].address, a);
}
