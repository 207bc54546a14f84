use dtelemetry::ClusterRole;
use dtelemetry::MemberState;
use dtelemetry::ProcessKind;
use tokio::time::Instant;

use crate::common::at_ms;
use crate::common::node_config;
use crate::common::raw_newest;
use crate::common::TestNode;

#[tokio::test(start_paused = true)]
async fn test_router_config_server_and_shard() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();

    let mut router = node_config(dir.path(), "mongos");
    router.server.process_kind = ProcessKind::Mongos;
    let router = TestNode::start(router);

    let mut cfg = node_config(dir.path(), "cfg0");
    cfg.cluster.replica_set_state = Some(MemberState::Primary);
    cfg.cluster.replication_id = Some("cfg-rs-id".to_string());
    cfg.cluster.cluster_role = ClusterRole::ConfigServer;
    let cfg = TestNode::start(cfg);

    let mut shard = node_config(dir.path(), "shard0");
    shard.cluster.replica_set_state = Some(MemberState::Primary);
    shard.cluster.replication_id = Some("shard-rs-id".to_string());
    shard.cluster.cluster_role = ClusterRole::ShardServer;
    let shard = TestNode::start(shard);

    at_ms(t0, 2_000).await;

    let snapshot = router.newest();
    assert_eq!(snapshot.source, "mongos");
    assert_eq!(snapshot.replication_state, None);
    assert!(!snapshot.shard_svr);
    assert!(!snapshot.config_svr);

    let snapshot = cfg.newest();
    assert!(snapshot.config_svr);
    assert!(!snapshot.shard_svr);
    assert_eq!(snapshot.db_replication_id.as_deref(), Some("cfg-rs-id"));
    let raw = raw_newest(cfg.handle.store(), &cfg.instance_id());
    assert!(raw.contains("\"config_svr\": \"true\""), "{raw}");
    assert!(!raw.contains("shard_svr"));

    let snapshot = shard.newest();
    assert!(snapshot.shard_svr);
    assert!(!snapshot.config_svr);
    let raw = raw_newest(shard.handle.store(), &shard.instance_id());
    assert!(raw.contains("\"shard_svr\": \"true\""), "{raw}");

    assert_eq!(router.handle.store().list_all().unwrap().len(), 3);

    router.stop().await;
    cfg.stop().await;
    shard.stop().await;
}

#[test]
fn test_router_declaring_storage_role_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = node_config(dir.path(), "mongos");
    config.server.process_kind = ProcessKind::Mongos;
    config.cluster.cluster_role = ClusterRole::ShardServer;

    assert!(config.validate().is_err());
}
