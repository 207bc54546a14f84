use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dtelemetry::constants::IDENTITY_FILE_NAME;
use dtelemetry::CollectorBuilder;
use dtelemetry::CollectorHandle;
use dtelemetry::RetentionStore;
use dtelemetry::RoleSource;
use dtelemetry::SchedulerStats;
use dtelemetry::Snapshot;
use dtelemetry::TelemetryNodeConfig;
use tokio::sync::watch;
use tokio::time::sleep_until;
use tokio::time::Instant;

pub const GRACE_SEC: u64 = 1;
pub const SCRAPE_SEC: u64 = 5;
pub const KEEP_SEC: u64 = 9;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Config for one instance rooted at `<root>/<name>`, sharing
/// `<root>/telemetry` with every other instance of the test
pub fn node_config(
    root: &Path,
    name: &str,
) -> TelemetryNodeConfig {
    let mut config = TelemetryNodeConfig::default();
    config.server.db_path = root.join(name).join("db");
    config.server.log_dir = root.join(name).join("logs");
    config.telemetry.telemetry_dir = telemetry_dir(root);
    config.telemetry.grace_period_in_sec = GRACE_SEC;
    config.telemetry.scrape_interval_in_sec = SCRAPE_SEC;
    config.telemetry.history_keep_interval_in_sec = KEEP_SEC;
    config
}

pub fn telemetry_dir(root: &Path) -> PathBuf {
    root.join("telemetry")
}

pub struct TestNode {
    pub handle: CollectorHandle,
    shutdown_tx: watch::Sender<()>,
}

impl TestNode {
    pub fn start(config: TelemetryNodeConfig) -> Self {
        Self::start_with(config, None)
    }

    pub fn start_with(
        config: TelemetryNodeConfig,
        roles: Option<Arc<dyn RoleSource>>,
    ) -> Self {
        enable_logger();
        let config = config.validate().expect("valid test config");
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let mut builder = CollectorBuilder::new(config, shutdown_rx);
        if let Some(roles) = roles {
            builder = builder.role_source(roles);
        }
        let handle = builder.build().expect("collector builds").spawn();

        Self { handle, shutdown_tx }
    }

    pub fn instance_id(&self) -> String {
        self.handle.identity().instance_id().to_string()
    }

    pub fn count(&self) -> usize {
        self.handle.store().list(&self.instance_id()).unwrap().len()
    }

    pub fn newest(&self) -> Snapshot {
        newest_of(self.handle.store(), &self.instance_id())
    }

    pub async fn stop(self) -> SchedulerStats {
        self.shutdown_tx.send(()).unwrap();
        self.handle.join().await.unwrap()
    }
}

pub fn newest_of(
    store: &RetentionStore,
    instance_id: &str,
) -> Snapshot {
    let files = store.list(instance_id).unwrap();
    let newest = files.last().expect("at least one snapshot");
    Snapshot::from_slice(&std::fs::read(&newest.path).unwrap()).unwrap()
}

pub fn raw_newest(
    store: &RetentionStore,
    instance_id: &str,
) -> String {
    let files = store.list(instance_id).unwrap();
    let newest = files.last().expect("at least one snapshot");
    std::fs::read_to_string(&newest.path).unwrap()
}

/// Instance id stored in the BSON identity record under `db_path`
pub fn recorded_instance_id(db_path: &Path) -> String {
    let raw = std::fs::read(db_path.join(IDENTITY_FILE_NAME)).unwrap();
    let record = bson::Document::from_reader(raw.as_slice()).unwrap();
    record.get_object_id("db_instance_id").unwrap().to_hex()
}

pub async fn at_ms(
    t0: Instant,
    ms: u64,
) {
    sleep_until(t0 + Duration::from_millis(ms)).await;
}
