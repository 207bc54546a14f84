//! The telemetry scheduler: one background loop per process.
//!
//! ```text
//! wake-up (deadline | control change | shutdown)
//!   -> load ControlState (one Arc for the whole cycle)
//!   -> reconcile enabled flag (disable purges this instance's files)
//!   -> if due: classify role -> build snapshot -> write -> prune
//!   -> sleep until next deadline
//! ```
//!
//! Sampling, serialization and pruning run synchronously on the loop's task.
//! Failures are logged and counted; the loop keeps its cadence.

mod state;
pub use state::*;


use std::future::pending;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::sleep_until;
use tokio::time::Instant;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use crate::classify_or_standalone;
use crate::utils::time::CaptureClock;
use crate::utils::ScopedTimer;
use crate::ControlState;
use crate::ControlSurface;
use crate::RetentionStore;
use crate::RoleSource;
use crate::SnapshotBuilder;

/// Counters accumulated over the scheduler's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub samples_written: u64,
    pub write_failures: u64,
    pub prune_failures: u64,
    pub files_pruned: u64,
    pub files_purged: u64,
}

pub struct Scheduler {
    control: Arc<ControlSurface>,
    store: Arc<RetentionStore>,
    builder: SnapshotBuilder,
    roles: Arc<dyn RoleSource>,
    clock: CaptureClock,
    state: SchedulerState,
    stats: SchedulerStats,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

impl Scheduler {
    /// The grace period of the initial activation counts from `started_at`
    pub fn new(
        control: Arc<ControlSurface>,
        store: Arc<RetentionStore>,
        builder: SnapshotBuilder,
        roles: Arc<dyn RoleSource>,
        started_at: Instant,
    ) -> Self {
        let state = SchedulerState::initial(&control.snapshot(), started_at);
        Self {
            control,
            store,
            builder,
            roles,
            clock: CaptureClock::new(),
            state,
            stats: SchedulerStats::default(),
        }
    }

    pub fn with_clock(
        mut self,
        clock: CaptureClock,
    ) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Runs until `shutdown_signal` fires or its sender is dropped.
    pub async fn run(
        mut self,
        mut shutdown_signal: watch::Receiver<()>,
    ) -> SchedulerStats {
        let surface = self.control.clone();
        info!(
            instance_id = self.builder.identity().instance_id(),
            state = ?self.state,
            "telemetry scheduler started"
        );

        loop {
            let control = surface.snapshot();
            self.reconcile(&control);

            if self.state.is_due(&control, Instant::now()) {
                self.run_cycle(&control);
                // a cycle slower than the interval leaves the next one due at once
                tokio::task::yield_now().await;
                if shutdown_signal.has_changed().unwrap_or(true) {
                    info!("telemetry scheduler shutting down");
                    break;
                }
                continue;
            }

            let deadline = self.state.deadline(&control);
            trace!(?deadline, state = ?self.state, "telemetry scheduler waiting");

            tokio::select! {
                _ = shutdown_signal.changed() => {
                    info!("telemetry scheduler shutting down");
                    break;
                }
                _ = surface.changed() => {
                    debug!("telemetry control state changed");
                }
                _ = async {
                    match deadline {
                        Some(d) => sleep_until(d).await,
                        None => pending::<()>().await,
                    }
                } => {}
            }
        }

        info!(stats = ?self.stats, "telemetry scheduler stopped");
        self.stats
    }

    /// Applies the enabled flag; a disable forgets every retained file
    pub(crate) fn reconcile(
        &mut self,
        control: &ControlState,
    ) {
        match self.state.on_control(control, Instant::now()) {
            Transition::Unchanged => {}
            Transition::Activated => {
                info!(
                    grace_period_ms = control.grace_period.as_millis() as u64,
                    "telemetry enabled, awaiting grace period"
                );
            }
            Transition::Deactivated => {
                let instance_id = self.builder.identity().instance_id();
                match self.store.purge(instance_id) {
                    Ok(purged) => {
                        self.stats.files_purged += purged as u64;
                        info!(purged, "telemetry disabled, retained snapshots removed");
                    }
                    Err(e) => {
                        warn!(error = %e, "telemetry disabled, failed to remove retained snapshots");
                    }
                }
            }
        }
    }

    /// Takes one sample, writes it and prunes. Never fails the loop.
    pub(crate) fn run_cycle(
        &mut self,
        control: &ControlState,
    ) {
        let _timer = ScopedTimer::new("telemetry_cycle");
        let sampled_at = Instant::now();

        let role = classify_or_standalone(self.roles.as_ref());
        let captured_at_ms = self.clock.now_ms();
        let snapshot = self.builder.build(&role, captured_at_ms);

        match self.store.write(&snapshot) {
            Ok(path) => {
                self.stats.samples_written += 1;
                debug!(path = %path.display(), role = ?role.role, "telemetry snapshot written");

                match self
                    .store
                    .prune(&snapshot.instance_id, captured_at_ms, control.history_keep_interval)
                {
                    Ok(pruned) => self.stats.files_pruned += pruned as u64,
                    Err(e) => {
                        self.stats.prune_failures += 1;
                        warn!(error = %e, "failed to prune telemetry snapshots");
                    }
                }
            }
            Err(e) => {
                self.stats.write_failures += 1;
                error!(error = %e, "failed to write telemetry snapshot, skipping cycle");
            }
        }

        self.state.after_sample(sampled_at);
    }
}
