//! The running collector and the handle to its background task.
//!
//! ## Example Usage
//! ```ignore
//! let collector = CollectorBuilder::new(config, shutdown_rx).build()?;
//! let handle = collector.spawn();
//! handle.control().set_scrape_interval(Duration::from_secs(60))?;
//! let stats = handle.join().await?;
//! ```

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ControlSurface;
use crate::InstanceIdentity;
use crate::Result;
use crate::RetentionStore;
use crate::Scheduler;
use crate::SchedulerStats;

pub struct Collector {
    pub(super) identity: Arc<InstanceIdentity>,
    pub(super) control: Arc<ControlSurface>,
    pub(super) store: Arc<RetentionStore>,
    pub(super) scheduler: Scheduler,
    pub(super) shutdown_signal: watch::Receiver<()>,
}

impl std::fmt::Debug for Collector {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Collector")
            .field("identity", &self.identity)
            .field("store", &self.store)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Collector {
    pub fn identity(&self) -> &Arc<InstanceIdentity> {
        &self.identity
    }

    /// Runtime parameter surface; setters take effect on the next wake-up
    pub fn control(&self) -> &Arc<ControlSurface> {
        &self.control
    }

    pub fn store(&self) -> &Arc<RetentionStore> {
        &self.store
    }

    /// Runs the scheduler on the current task until shutdown
    pub async fn run(self) -> SchedulerStats {
        self.scheduler.run(self.shutdown_signal).await
    }

    /// Runs the scheduler as a background task
    pub fn spawn(self) -> CollectorHandle {
        let identity = self.identity.clone();
        let control = self.control.clone();
        let store = self.store.clone();
        let task = tokio::spawn(self.scheduler.run(self.shutdown_signal));

        CollectorHandle {
            identity,
            control,
            store,
            task,
        }
    }
}

pub struct CollectorHandle {
    identity: Arc<InstanceIdentity>,
    control: Arc<ControlSurface>,
    store: Arc<RetentionStore>,
    task: JoinHandle<SchedulerStats>,
}

impl CollectorHandle {
    pub fn identity(&self) -> &Arc<InstanceIdentity> {
        &self.identity
    }

    pub fn control(&self) -> &Arc<ControlSurface> {
        &self.control
    }

    pub fn store(&self) -> &Arc<RetentionStore> {
        &self.store
    }

    /// Waits for the scheduler to stop after the shutdown signal fired
    pub async fn join(self) -> Result<SchedulerStats> {
        Ok(self.task.await?)
    }
}
