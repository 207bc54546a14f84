use tokio::time::Instant;

use crate::ControlState;

/// Sampling state machine.
///
/// Deadlines are derived from the control state on every wake-up instead of
/// being stored, so a changed interval applies to the pending wait without
/// any extra bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Disabled,
    /// Activated at `since`; first sample due at `since + grace_period`
    AwaitingGracePeriod { since: Instant },
    /// Next sample due at `last_sample + scrape_interval`
    Sampling { last_sample: Instant },
}

/// Outcome of reconciling the state with the enabled flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// Disabled -> AwaitingGracePeriod
    Activated,
    /// AwaitingGracePeriod | Sampling -> Disabled
    Deactivated,
}

impl SchedulerState {
    pub fn initial(
        control: &ControlState,
        now: Instant,
    ) -> Self {
        if control.enabled {
            SchedulerState::AwaitingGracePeriod { since: now }
        } else {
            SchedulerState::Disabled
        }
    }

    /// When the next sample is due. `None` while disabled, and when the
    /// interval reaches past what the monotonic clock can represent.
    pub fn deadline(
        &self,
        control: &ControlState,
    ) -> Option<Instant> {
        match self {
            SchedulerState::Disabled => None,
            SchedulerState::AwaitingGracePeriod { since } => since.checked_add(control.grace_period),
            SchedulerState::Sampling { last_sample } => {
                last_sample.checked_add(control.scrape_interval)
            }
        }
    }

    pub fn is_due(
        &self,
        control: &ControlState,
        now: Instant,
    ) -> bool {
        self.deadline(control).is_some_and(|d| d <= now)
    }

    /// Applies the enabled flag. Enabling is a fresh activation: the grace
    /// period starts again from `now`.
    pub fn on_control(
        &mut self,
        control: &ControlState,
        now: Instant,
    ) -> Transition {
        match (*self, control.enabled) {
            (SchedulerState::Disabled, true) => {
                *self = SchedulerState::AwaitingGracePeriod { since: now };
                Transition::Activated
            }
            (SchedulerState::Disabled, false) => Transition::Unchanged,
            (_, false) => {
                *self = SchedulerState::Disabled;
                Transition::Deactivated
            }
            (_, true) => Transition::Unchanged,
        }
    }

    /// A sample ran at `sampled_at`, whether or not its write succeeded
    pub fn after_sample(
        &mut self,
        sampled_at: Instant,
    ) {
        if *self != SchedulerState::Disabled {
            *self = SchedulerState::Sampling {
                last_sample: sampled_at,
            };
        }
    }
}
