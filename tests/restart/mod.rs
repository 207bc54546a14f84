use dtelemetry::constants::IDENTITY_FILE_NAME;
use tokio::time::Instant;

use crate::common::at_ms;
use crate::common::node_config;
use crate::common::recorded_instance_id;
use crate::common::TestNode;

#[tokio::test(start_paused = true)]
async fn test_instance_id_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = node_config(dir.path(), "standalone");

    let t0 = Instant::now();
    let first = TestNode::start(config.clone());
    at_ms(t0, 2_000).await;
    let instance_id = first.instance_id();
    let first_internal = first.newest().internal_id;
    first.stop().await;

    let t1 = Instant::now();
    let second = TestNode::start(config);
    at_ms(t1, 2_000).await;

    assert_eq!(second.instance_id(), instance_id);
    assert_eq!(second.count(), 2, "previous run's snapshot is still retained");
    let snapshot = second.newest();
    assert_eq!(snapshot.instance_id, instance_id);
    assert_ne!(snapshot.internal_id, first_internal);

    second.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_corrupt_identity_record_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let config = node_config(dir.path(), "standalone");
    let db_path = config.server.db_path.clone();
    let record = db_path.join(IDENTITY_FILE_NAME);
    std::fs::create_dir_all(&config.server.db_path).unwrap();
    std::fs::write(&record, b"not json").unwrap();

    let t0 = Instant::now();
    let node = TestNode::start(config);
    at_ms(t0, 1_500).await;

    assert_eq!(recorded_instance_id(&db_path), node.instance_id());
    assert_eq!(node.count(), 1);

    node.stop().await;
}
