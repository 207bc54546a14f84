use std::sync::Arc;

use tokio::time::Instant;

use super::Snapshot;
use crate::constants::SOURCE_MONGOD;
use crate::constants::SOURCE_MONGOS;
use crate::constants::SOURCE_PRO_SUFFIX;
use crate::InstanceIdentity;
use crate::ProcessKind;
use crate::RoleClassification;

/// Server build metadata, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub process_kind: ProcessKind,
    pub storage_engine: String,
    pub pillar_version: String,
    pub pro_features: Vec<String>,
}

impl BuildInfo {
    pub fn is_pro(&self) -> bool {
        !self.pro_features.is_empty()
    }
}

/// Renders snapshots from live server state.
///
/// Holds only immutable inputs; the role classification and capture time
/// are passed in per call so building never blocks.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    identity: Arc<InstanceIdentity>,
    build: BuildInfo,
    started_at: Instant,
}

impl SnapshotBuilder {
    /// Uptime is measured from now
    pub fn new(
        identity: Arc<InstanceIdentity>,
        build: BuildInfo,
    ) -> Self {
        Self::with_start(identity, build, Instant::now())
    }

    pub fn with_start(
        identity: Arc<InstanceIdentity>,
        build: BuildInfo,
        started_at: Instant,
    ) -> Self {
        Self {
            identity,
            build,
            started_at,
        }
    }

    pub fn identity(&self) -> &Arc<InstanceIdentity> {
        &self.identity
    }

    pub fn build(
        &self,
        role: &RoleClassification,
        captured_at_ms: u64,
    ) -> Snapshot {
        let is_router = role.is_router() || self.build.process_kind == ProcessKind::Mongos;
        let replica_set_member = !is_router && role.role.is_replica_set_member();

        Snapshot {
            instance_id: self.identity.instance_id().to_string(),
            internal_id: self.identity.internal_id().to_string(),
            source: self.source(is_router),
            storage_engine: self.build.storage_engine.clone(),
            pro_features: self.build.pro_features.clone(),
            pillar_version: self.build.pillar_version.clone(),
            uptime_seconds: self.started_at.elapsed().as_secs(),
            replication_state: role
                .role
                .replication_state()
                .filter(|_| replica_set_member)
                .map(str::to_string),
            db_replication_id: role.db_replication_id.clone().filter(|_| replica_set_member),
            shard_svr: !is_router && role.shard_svr,
            config_svr: !is_router && role.config_svr,
            captured_at_ms,
        }
    }

    fn source(
        &self,
        is_router: bool,
    ) -> String {
        let base = if is_router { SOURCE_MONGOS } else { SOURCE_MONGOD };
        if self.build.is_pro() {
            format!("{base}{SOURCE_PRO_SUFFIX}")
        } else {
            base.to_string()
        }
    }
}
