use std::sync::Arc;

use dtelemetry::MemberState;
use dtelemetry::RoleState;
use dtelemetry::SharedRoleSource;
use tokio::time::Instant;

use crate::common::at_ms;
use crate::common::node_config;
use crate::common::TestNode;
use crate::common::KEEP_SEC;
use crate::common::SCRAPE_SEC;

const REPLICATION_ID: &str = "65f1c2a7e4b0a1d2c3e4f5a6";

fn member(
    root: &std::path::Path,
    name: &str,
    state: MemberState,
) -> TestNode {
    let mut config = node_config(root, name);
    config.cluster.replica_set_state = Some(state);
    config.cluster.replication_id = Some(REPLICATION_ID.to_string());
    TestNode::start(config)
}

#[tokio::test(start_paused = true)]
async fn test_three_members_share_directory() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();
    let primary = member(dir.path(), "rs0", MemberState::Primary);
    let secondary = member(dir.path(), "rs1", MemberState::Secondary);
    let arbiter = member(dir.path(), "rs2", MemberState::Arbiter);

    at_ms(t0, 2_000).await;

    let ids = [
        primary.instance_id(),
        secondary.instance_id(),
        arbiter.instance_id(),
    ];
    assert_ne!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
    assert_ne!(ids[0], ids[2]);

    for (node, state) in [
        (&primary, "PRIMARY"),
        (&secondary, "SECONDARY"),
        (&arbiter, "ARBITER"),
    ] {
        let snapshot = node.newest();
        assert_eq!(snapshot.replication_state.as_deref(), Some(state));
        assert_eq!(snapshot.db_replication_id.as_deref(), Some(REPLICATION_ID));
        assert!(!snapshot.shard_svr);
    }

    let all = primary.handle.store().list_all().unwrap();
    assert_eq!(all.len(), 3);

    // each member keeps its own window
    at_ms(t0, 60_000).await;
    let bound = ((KEEP_SEC + SCRAPE_SEC - 1) / SCRAPE_SEC + 1) as usize;
    for node in [&primary, &secondary, &arbiter] {
        let count = node.count();
        assert!((1..=bound).contains(&count), "count={count} bound={bound}");
    }

    primary.stop().await;
    secondary.stop().await;
    arbiter.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failover_is_reflected_in_next_sample() {
    let dir = tempfile::tempdir().unwrap();
    let roles = Arc::new(SharedRoleSource::new(Some(RoleState::replica_set_member(
        MemberState::Secondary,
        REPLICATION_ID,
    ))));
    let t0 = Instant::now();
    let node = TestNode::start_with(node_config(dir.path(), "rs1"), Some(roles.clone()));

    at_ms(t0, 2_000).await;
    assert_eq!(node.newest().replication_state.as_deref(), Some("SECONDARY"));

    roles.publish(RoleState::replica_set_member(MemberState::Primary, REPLICATION_ID));
    at_ms(t0, 7_000).await;
    assert_eq!(node.newest().replication_state.as_deref(), Some("PRIMARY"));

    node.stop().await;
}
