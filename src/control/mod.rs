//! Runtime control parameters.
//!
//! The control state is replaced as a whole on every mutation
//! (read-copy-update over `ArcSwap`). The scheduler loads one `Arc` per
//! wake-up and uses it for the entire cycle, so it sees either the old or
//! the new state, never a mix of both.


use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use arc_swap::Guard;
use tokio::sync::Notify;
use tracing::info;

use crate::Error;
use crate::Result;

/// Shortest accepted scrape interval
pub const MIN_SCRAPE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
    /// Delay between activation and the first sample
    pub grace_period: Duration,
    /// Delay between consecutive samples
    pub scrape_interval: Duration,
    /// Maximum age of a retained snapshot
    pub history_keep_interval: Duration,
}

impl ControlState {
    pub fn validate(&self) -> Result<()> {
        if self.scrape_interval < MIN_SCRAPE_INTERVAL {
            return Err(Error::InvalidParameter(format!(
                "scrape_interval must be at least {}s, got {:?}",
                MIN_SCRAPE_INTERVAL.as_secs(),
                self.scrape_interval
            )));
        }
        Ok(())
    }

    /// Upper bound on retained files per running instance:
    /// `ceil(keep / scrape) + 1`
    pub fn retention_bound(&self) -> usize {
        let scrape = self.scrape_interval.as_millis().max(1);
        let keep = self.history_keep_interval.as_millis();
        let windows = keep.div_ceil(scrape);
        usize::try_from(windows).unwrap_or(usize::MAX).saturating_add(1)
    }
}

/// Single point of synchronized access to the control state
#[derive(Debug)]
pub struct ControlSurface {
    state: ArcSwap<ControlState>,
    changed: Notify,
}

impl ControlSurface {
    pub fn new(initial: ControlState) -> Result<Self> {
        initial.validate()?;
        Ok(Self {
            state: ArcSwap::from_pointee(initial),
            changed: Notify::new(),
        })
    }

    /// Consistent view of every parameter
    pub fn snapshot(&self) -> Arc<ControlState> {
        self.state.load_full()
    }

    /// Applies `f` to a copy of the current state and publishes the result.
    ///
    /// Concurrent updates are retried against the latest state. An update
    /// that changes nothing does not wake the scheduler. Invalid results are
    /// rejected and the current state is kept.
    pub fn update<F>(
        &self,
        mut f: F,
    ) -> Result<Arc<ControlState>>
    where
        F: FnMut(&mut ControlState),
    {
        let mut current = self.state.load_full();
        loop {
            let mut next = (*current).clone();
            f(&mut next);
            next.validate()?;
            if next == *current {
                return Ok(current);
            }

            let next = Arc::new(next);
            let prev = self.state.compare_and_swap(&current, Arc::clone(&next));
            if Arc::ptr_eq(&*prev, &current) {
                info!(
                    enabled = next.enabled,
                    grace_period_ms = next.grace_period.as_millis() as u64,
                    scrape_interval_ms = next.scrape_interval.as_millis() as u64,
                    history_keep_interval_ms = next.history_keep_interval.as_millis() as u64,
                    "telemetry control state updated"
                );
                self.changed.notify_one();
                return Ok(next);
            }
            current = Guard::into_inner(prev);
        }
    }

    pub fn set_enabled(
        &self,
        enabled: bool,
    ) -> Result<()> {
        self.update(|s| s.enabled = enabled).map(|_| ())
    }

    pub fn set_grace_period(
        &self,
        grace_period: Duration,
    ) -> Result<()> {
        self.update(|s| s.grace_period = grace_period).map(|_| ())
    }

    pub fn set_scrape_interval(
        &self,
        scrape_interval: Duration,
    ) -> Result<()> {
        self.update(|s| s.scrape_interval = scrape_interval).map(|_| ())
    }

    pub fn set_history_keep_interval(
        &self,
        history_keep_interval: Duration,
    ) -> Result<()> {
        self.update(|s| s.history_keep_interval = history_keep_interval)
            .map(|_| ())
    }

    /// Resolves after the next published change (or immediately if one
    /// happened since the last call).
    pub(crate) async fn changed(&self) {
        self.changed.notified().await
    }
}
