use tracing::debug;

use super::ClusterRole;
use super::MemberState;
use super::ProcessKind;
use super::RoleState;

/// Operational role of the node at sampling time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Standalone,
    ReplicaSetPrimary,
    ReplicaSetSecondary,
    ReplicaSetArbiter,
    /// Replica set member in a transitional state (startup, recovering, ...)
    ReplicaSetOther(MemberState),
    Router,
    /// Role information was inconsistent; reported like a standalone node
    Unknown,
}

impl NodeRole {
    pub fn is_replica_set_member(&self) -> bool {
        matches!(
            self,
            NodeRole::ReplicaSetPrimary
                | NodeRole::ReplicaSetSecondary
                | NodeRole::ReplicaSetArbiter
                | NodeRole::ReplicaSetOther(_)
        )
    }

    /// Value rendered into `replication_state`
    pub fn replication_state(&self) -> Option<&'static str> {
        match self {
            NodeRole::ReplicaSetPrimary => Some(MemberState::Primary.as_str()),
            NodeRole::ReplicaSetSecondary => Some(MemberState::Secondary.as_str()),
            NodeRole::ReplicaSetArbiter => Some(MemberState::Arbiter.as_str()),
            NodeRole::ReplicaSetOther(state) => Some(state.as_str()),
            NodeRole::Standalone | NodeRole::Router | NodeRole::Unknown => None,
        }
    }
}

/// Classifier output consumed by the snapshot builder
///
/// `db_replication_id` is `Some` iff `role` is a replica set variant;
/// `shard_svr` / `config_svr` are never set on a router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleClassification {
    pub role: NodeRole,
    pub db_replication_id: Option<String>,
    pub shard_svr: bool,
    pub config_svr: bool,
}

impl RoleClassification {
    pub fn standalone() -> Self {
        Self {
            role: NodeRole::Standalone,
            db_replication_id: None,
            shard_svr: false,
            config_svr: false,
        }
    }

    pub fn is_router(&self) -> bool {
        self.role == NodeRole::Router
    }
}

/// Maps a role state onto its classification.
pub fn classify(state: &RoleState) -> RoleClassification {
    if state.process_kind == ProcessKind::Mongos {
        return RoleClassification {
            role: NodeRole::Router,
            db_replication_id: None,
            shard_svr: false,
            config_svr: false,
        };
    }

    let shard_svr = state.cluster_role == ClusterRole::ShardServer;
    let config_svr = state.cluster_role == ClusterRole::ConfigServer;

    let Some(rs) = &state.replica_set else {
        return RoleClassification {
            role: NodeRole::Standalone,
            db_replication_id: None,
            shard_svr,
            config_svr,
        };
    };

    if rs.replication_id.trim().is_empty() {
        debug!(member_state = rs.member_state.as_str(), "replica set member without replication id");
        return RoleClassification {
            role: NodeRole::Unknown,
            db_replication_id: None,
            shard_svr,
            config_svr,
        };
    }

    let role = match rs.member_state {
        MemberState::Primary => NodeRole::ReplicaSetPrimary,
        MemberState::Secondary => NodeRole::ReplicaSetSecondary,
        MemberState::Arbiter => NodeRole::ReplicaSetArbiter,
        other => NodeRole::ReplicaSetOther(other),
    };

    RoleClassification {
        role,
        db_replication_id: Some(rs.replication_id.clone()),
        shard_svr,
        config_svr,
    }
}

/// Classifies whatever the source currently reports, falling back to a
/// standalone classification when the lookup is unavailable.
pub fn classify_or_standalone(source: &dyn super::RoleSource) -> RoleClassification {
    match source.current() {
        Some(state) => classify(&state),
        None => {
            debug!("role lookup unavailable, classifying as standalone");
            RoleClassification::standalone()
        }
    }
}
