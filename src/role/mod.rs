//! Role classification for clustered deployments.
//!
//! The classifier never talks to the clustering layer itself. Whatever owns
//! replication and sharding state publishes a plain [`RoleState`] value
//! through a [`RoleSource`]; the collector reads it once per sample and maps
//! it to a [`RoleClassification`] with [`classify`].

mod classifier;
mod source;
pub use classifier::*;
pub use source::*;


use serde::Deserialize;
use serde::Serialize;

/// Which server binary hosts the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    /// Storage node
    #[default]
    Mongod,
    /// Query router
    Mongos,
}

/// Replica set member state as reported by the replication subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberState {
    Startup,
    Primary,
    Secondary,
    Recovering,
    Startup2,
    Unknown,
    Arbiter,
    Down,
    Rollback,
    Removed,
}

impl MemberState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberState::Startup => "STARTUP",
            MemberState::Primary => "PRIMARY",
            MemberState::Secondary => "SECONDARY",
            MemberState::Recovering => "RECOVERING",
            MemberState::Startup2 => "STARTUP2",
            MemberState::Unknown => "UNKNOWN",
            MemberState::Arbiter => "ARBITER",
            MemberState::Down => "DOWN",
            MemberState::Rollback => "ROLLBACK",
            MemberState::Removed => "REMOVED",
        }
    }
}

/// Sharding role a storage node was started with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClusterRole {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "shardsvr")]
    ShardServer,
    #[serde(rename = "configsvr")]
    ConfigServer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSetState {
    pub member_state: MemberState,
    /// Shared by every member of the same replica set
    pub replication_id: String,
}

/// Point-in-time role input published by the clustering layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleState {
    pub process_kind: ProcessKind,
    pub replica_set: Option<ReplicaSetState>,
    pub cluster_role: ClusterRole,
}

impl RoleState {
    pub fn standalone() -> Self {
        Self {
            process_kind: ProcessKind::Mongod,
            replica_set: None,
            cluster_role: ClusterRole::None,
        }
    }

    pub fn router() -> Self {
        Self {
            process_kind: ProcessKind::Mongos,
            replica_set: None,
            cluster_role: ClusterRole::None,
        }
    }

    pub fn replica_set_member(
        member_state: MemberState,
        replication_id: impl Into<String>,
    ) -> Self {
        Self {
            process_kind: ProcessKind::Mongod,
            replica_set: Some(ReplicaSetState {
                member_state,
                replication_id: replication_id.into(),
            }),
            cluster_role: ClusterRole::None,
        }
    }

    pub fn with_cluster_role(
        mut self,
        cluster_role: ClusterRole,
    ) -> Self {
        self.cluster_role = cluster_role;
        self
    }
}
