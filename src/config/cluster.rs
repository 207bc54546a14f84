use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::ClusterRole;
use crate::Error;
use crate::MemberState;
use crate::ProcessKind;
use crate::ReplicaSetState;
use crate::Result;
use crate::RoleState;

/// Static role description for deployments where no clustering layer
/// publishes role changes at runtime.
///
/// Embedders with a live replication subsystem should feed a
/// `SharedRoleSource` instead and leave this at its defaults.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ClusterConfig {
    /// Replica set member state; absent on standalone nodes
    #[serde(default)]
    pub replica_set_state: Option<MemberState>,

    /// Identifier shared by all members of the replica set
    #[serde(default)]
    pub replication_id: Option<String>,

    #[serde(default)]
    pub cluster_role: ClusterRole,
}

impl ClusterConfig {
    /// Validates cluster role consistency
    pub fn validate(&self) -> Result<()> {
        if self.replica_set_state.is_some() {
            let has_id = self
                .replication_id
                .as_deref()
                .map(|id| !id.trim().is_empty())
                .unwrap_or(false);
            if !has_id {
                return Err(Error::Config(ConfigError::Message(
                    "replication_id is required when replica_set_state is set".into(),
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn declares_storage_role(&self) -> bool {
        self.replica_set_state.is_some() || self.cluster_role != ClusterRole::None
    }

    /// Role state as the classifier consumes it
    pub fn role_state(
        &self,
        process_kind: ProcessKind,
    ) -> RoleState {
        let replica_set = match (self.replica_set_state, &self.replication_id) {
            (Some(member_state), Some(replication_id)) => Some(ReplicaSetState {
                member_state,
                replication_id: replication_id.clone(),
            }),
            _ => None,
        };
        RoleState {
            process_kind,
            replica_set,
            cluster_role: self.cluster_role,
        }
    }
}
