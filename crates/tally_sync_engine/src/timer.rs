//! Cancellable timers owned by the sync engine.

use std::time::Instant;

/// The timers that drive the reconciliation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// End of the debounce quiescence window.
    Debounce,
    /// Deadline for the in-flight push attempt.
    PushDeadline,
    /// Next retry after a failed push.
    Retry,
}

/// Explicit deadlines for the engine's scheduled work.
///
/// Timers are cancellable deadlines owned by the engine: armed and
/// cancelled on events, surfaced to a driver through
/// [`TimerSet::next_deadline`], and fired through [`TimerSet::take_due`].
/// Dropping the set cancels all pending timers without touching any
/// other state.
#[derive(Debug, Default)]
pub struct TimerSet {
    debounce: Option<Instant>,
    push_deadline: Option<Instant>,
    retry: Option<Instant>,
}

impl TimerSet {
    /// Creates a set with no timers armed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) a timer at `deadline`.
    pub fn arm(&mut self, kind: TimerKind, deadline: Instant) {
        *self.slot(kind) = Some(deadline);
    }

    /// Cancels a timer if armed.
    pub fn cancel(&mut self, kind: TimerKind) {
        *self.slot(kind) = None;
    }

    /// Returns true if the timer is armed.
    #[must_use]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Debounce => self.debounce.is_some(),
            TimerKind::PushDeadline => self.push_deadline.is_some(),
            TimerKind::Retry => self.retry.is_some(),
        }
    }

    /// Returns the earliest armed deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.debounce, self.push_deadline, self.retry]
            .into_iter()
            .flatten()
            .min()
    }

    /// Disarms and returns all timers due at `now`.
    ///
    /// Fired timers are returned in resolution order: the push deadline
    /// first (it settles the in-flight attempt), then debounce, then
    /// retry.
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due = Vec::new();
        for kind in [TimerKind::PushDeadline, TimerKind::Debounce, TimerKind::Retry] {
            let slot = self.slot(kind);
            if slot.is_some_and(|deadline| deadline <= now) {
                *slot = None;
                due.push(kind);
            }
        }
        due
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<Instant> {
        match kind {
            TimerKind::Debounce => &mut self.debounce,
            TimerKind::PushDeadline => &mut self.push_deadline,
            TimerKind::Retry => &mut self.retry,
        }
    }
}
