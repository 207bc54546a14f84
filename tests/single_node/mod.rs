use tokio::time::Instant;

use crate::common::at_ms;
use crate::common::node_config;
use crate::common::raw_newest;
use crate::common::recorded_instance_id;
use crate::common::TestNode;

/// g=1s, s=5s, k=9s: samples at 1s, 6s and 11s; the 1s sample ages out at 11s.
#[tokio::test(start_paused = true)]
async fn test_standalone_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();
    let node = TestNode::start(node_config(dir.path(), "standalone"));

    at_ms(t0, 500).await;
    assert_eq!(node.count(), 0);

    at_ms(t0, 2_000).await;
    assert_eq!(node.count(), 1);

    assert_eq!(
        recorded_instance_id(&dir.path().join("standalone/db")),
        node.instance_id()
    );

    let snapshot = node.newest();
    assert_eq!(snapshot.instance_id, node.instance_id());
    assert_eq!(snapshot.source, "mongod");
    assert_eq!(snapshot.storage_engine, "wiredTiger");
    assert_eq!(snapshot.replication_state, None);
    assert!(!snapshot.shard_svr);
    assert!(!snapshot.config_svr);

    let raw = raw_newest(node.handle.store(), &node.instance_id());
    for key in [
        "\"db_instance_id\"",
        "\"db_internal_id\"",
        "\"pro_features\"",
        "\"source\"",
        "\"storage_engine\"",
        "\"pillar_version\"",
        "\"uptime\"",
    ] {
        assert!(raw.contains(key), "missing {key} in {raw}");
    }
    assert!(!raw.contains("replication_state"));
    assert!(!raw.contains("shard_svr"));

    at_ms(t0, 7_000).await;
    assert_eq!(node.count(), 2);

    at_ms(t0, 12_000).await;
    assert_eq!(node.count(), 2);

    let stats = node.stop().await;
    assert_eq!(stats.samples_written, 3);
    assert_eq!(stats.files_pruned, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disable_then_enable() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();
    let node = TestNode::start(node_config(dir.path(), "standalone"));

    at_ms(t0, 7_000).await;
    assert_eq!(node.count(), 2);

    node.handle.control().set_enabled(false).unwrap();
    at_ms(t0, 7_100).await;
    assert_eq!(node.count(), 0);

    at_ms(t0, 20_000).await;
    assert_eq!(node.count(), 0);

    node.handle.control().set_enabled(true).unwrap();
    at_ms(t0, 23_000).await;
    assert_eq!(node.count(), 1);

    node.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_pro_build_marks_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = node_config(dir.path(), "pro");
    config.server.pro_features = vec!["featureA".to_string(), "featureB".to_string()];
    let t0 = Instant::now();
    let node = TestNode::start(config);

    at_ms(t0, 1_500).await;
    let snapshot = node.newest();
    assert_eq!(snapshot.source, "mongod-pro");
    assert_eq!(snapshot.pro_features, vec!["featureA", "featureB"]);

    node.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_runtime_interval_changes() {
    let dir = tempfile::tempdir().unwrap();
    let t0 = Instant::now();
    let node = TestNode::start(node_config(dir.path(), "standalone"));

    at_ms(t0, 1_500).await;
    assert_eq!(node.count(), 1);

    node.handle
        .control()
        .set_history_keep_interval(std::time::Duration::from_secs(60))
        .unwrap();
    node.handle
        .control()
        .set_scrape_interval(std::time::Duration::from_secs(1))
        .unwrap();

    // samples at 1s, 2s, 3s, 4s, 5s
    at_ms(t0, 5_500).await;
    assert_eq!(node.count(), 5);

    node.stop().await;
}
