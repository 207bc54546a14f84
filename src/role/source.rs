use std::sync::Arc;

use arc_swap::ArcSwapOption;
#[cfg(test)]
use mockall::automock;

use super::RoleState;

/// Non-blocking access to the node's current role state.
///
/// Implementations MUST return immediately: the scheduler calls this on its
/// own thread once per sample and never waits on cluster coordination.
/// `None` means the role is not known right now.
#[cfg_attr(test, automock)]
pub trait RoleSource: Send + Sync + 'static {
    fn current(&self) -> Option<RoleState>;
}

/// Fixed role, typically built from `ClusterConfig`
#[derive(Debug, Clone)]
pub struct StaticRoleSource {
    state: RoleState,
}

impl StaticRoleSource {
    pub fn new(state: RoleState) -> Self {
        Self { state }
    }
}

impl RoleSource for StaticRoleSource {
    fn current(&self) -> Option<RoleState> {
        Some(self.state.clone())
    }
}

/// Role published by the host's replication layer, e.g. on failover.
///
/// Starts empty until the first `publish`.
#[derive(Debug, Default)]
pub struct SharedRoleSource {
    state: ArcSwapOption<RoleState>,
}

impl SharedRoleSource {
    pub fn new(initial: Option<RoleState>) -> Self {
        Self {
            state: ArcSwapOption::new(initial.map(Arc::new)),
        }
    }

    pub fn publish(
        &self,
        state: RoleState,
    ) {
        self.state.store(Some(Arc::new(state)));
    }

    /// Marks the role as unknown until the next publish
    pub fn clear(&self) {
        self.state.store(None);
    }
}

impl RoleSource for SharedRoleSource {
    fn current(&self) -> Option<RoleState> {
        self.state.load_full().map(|s| (*s).clone())
    }
}
