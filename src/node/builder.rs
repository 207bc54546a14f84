//! A builder for assembling a [`Collector`] from a validated configuration.
//!
//! The [`CollectorBuilder`] wires the collector's components together:
//! instance identity, control surface, retention store, snapshot builder,
//! role source and scheduler.
//!
//! ## Example
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let handle = CollectorBuilder::new(config, shutdown_rx)
//!     .role_source(roles) // Optional override
//!     .build()?
//!     .spawn();
//! ```
//!
//! ## Notes
//! - An identity record that cannot be persisted does not stop the build; the collector runs
//!   with an in-memory identity for this process run and logs the failure.
//! - Shutdown is cooperative through the `watch::Receiver` passed to [`CollectorBuilder::new`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::error;
use tracing::info;

use super::Collector;
use crate::config::TelemetryNodeConfig;
use crate::identity::generate_id;
use crate::identity::load_or_create;
use crate::utils::time::CaptureClock;
use crate::ControlSurface;
use crate::InstanceIdentity;
use crate::Result;
use crate::RetentionStore;
use crate::RoleSource;
use crate::Scheduler;
use crate::SnapshotBuilder;
use crate::StaticRoleSource;

pub struct CollectorBuilder {
    config: TelemetryNodeConfig,
    shutdown_signal: watch::Receiver<()>,
    role_source: Option<Arc<dyn RoleSource>>,
    started_at: Option<Instant>,
    clock: Option<CaptureClock>,
}

impl CollectorBuilder {
    /// `config` is expected to have been validated already
    pub fn new(
        config: TelemetryNodeConfig,
        shutdown_signal: watch::Receiver<()>,
    ) -> Self {
        Self {
            config,
            shutdown_signal,
            role_source: None,
            started_at: None,
            clock: None,
        }
    }

    /// Sets a live role source. Defaults to the role declared in the config.
    pub fn role_source(
        mut self,
        role_source: Arc<dyn RoleSource>,
    ) -> Self {
        self.role_source = Some(role_source);
        self
    }

    /// Process start instant, used for uptime and the first grace period
    pub fn started_at(
        mut self,
        started_at: Instant,
    ) -> Self {
        self.started_at = Some(started_at);
        self
    }

    pub fn clock(
        mut self,
        clock: CaptureClock,
    ) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Collector> {
        let CollectorBuilder {
            config,
            shutdown_signal,
            role_source,
            started_at,
            clock,
        } = self;
        let started_at = started_at.unwrap_or_else(Instant::now);

        let identity = Arc::new(Self::load_identity(&config));
        let control = Arc::new(ControlSurface::new(config.telemetry.control_state())?);
        let store = Arc::new(RetentionStore::new(config.telemetry.telemetry_dir.clone()));

        let roles = role_source.unwrap_or_else(|| {
            Arc::new(StaticRoleSource::new(
                config.cluster.role_state(config.server.process_kind),
            ))
        });

        let builder =
            SnapshotBuilder::with_start(identity.clone(), config.server.build_info(), started_at);
        let mut scheduler = Scheduler::new(control.clone(), store.clone(), builder, roles, started_at);
        if let Some(clock) = clock {
            scheduler = scheduler.with_clock(clock);
        }

        info!(
            instance_id = identity.instance_id(),
            telemetry_dir = %store.dir().display(),
            enabled = config.telemetry.enabled,
            "telemetry collector built"
        );

        Ok(Collector {
            identity,
            control,
            store,
            scheduler,
            shutdown_signal,
        })
    }

    fn load_identity(config: &TelemetryNodeConfig) -> InstanceIdentity {
        match load_or_create(&config.server.db_path) {
            Ok((identity, _origin)) => identity,
            Err(e) => {
                error!(
                    error = %e,
                    db_path = %config.server.db_path.display(),
                    "failed to persist telemetry identity, using an in-memory identity for this run"
                );
                InstanceIdentity::new(generate_id(), generate_id())
            }
        }
    }
}
