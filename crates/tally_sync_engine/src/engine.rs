//! Reconciliation state machine for one counter session.

use crate::cache::SessionCache;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::load::LoadedSession;
use crate::timer::{TimerKind, TimerSet};
use std::time::Instant;
use tally_core::{CounterMap, SessionId, Template};
use tally_storage::KeyValueStore;
use tracing::{debug, warn};

/// Sync state of a session.
///
/// Owned solely by the engine; the UI layer reads it to render the
/// tri-state save indicator and never writes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Local state matches the last confirmed remote snapshot.
    Synced,
    /// Local edits are pending or a push is in flight.
    Syncing,
    /// The last push failed; retries are scheduled.
    ErrorRetrying,
}

impl SyncStatus {
    /// Returns true when all local edits are confirmed remote.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncStatus::Synced)
    }

    /// Returns true while the engine is in its failure/retry cycle.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, SyncStatus::ErrorRetrying)
    }
}

/// Identifier for one push attempt.
///
/// A fresh id is allocated per attempt. A result carrying an id that is
/// no longer in flight (superseded by its deadline) is ignored, which is
/// how the engine races its own wait against the network call without
/// cancelling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushAttemptId(u64);

impl PushAttemptId {
    /// Returns the raw attempt number.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// A push the engine wants issued against the remote store.
///
/// The driver hands `counts` and `timestamp_ms` to
/// [`crate::SessionGateway::update_session`] and reports the outcome back
/// through [`SyncEngine::complete_push`] with the same attempt id.
#[derive(Debug, Clone)]
pub struct PushRequest {
    /// Attempt identifier to echo back on completion.
    pub attempt: PushAttemptId,
    /// Counter snapshot captured at attempt start.
    pub counts: CounterMap,
    /// Wall-clock timestamp captured at attempt start, in Unix
    /// milliseconds. Passed through to the remote store for its own
    /// ordering checks.
    pub timestamp_ms: u64,
}

#[derive(Debug)]
struct InFlight {
    attempt: PushAttemptId,
    snapshot: CounterMap,
}

/// The reconciliation engine for one counter session.
///
/// A deterministic, single-threaded state machine: every method is a
/// reaction to one discrete event (a button press, a timer firing, a
/// push resolving) and runs to completion before the next, so the
/// counter map, the last-known-remote snapshot, and the status never
/// observe a torn intermediate value. Time is always supplied by the
/// caller; [`crate::SessionSyncHandle`] provides real timers and real
/// pushes on top.
///
/// # Invariants
///
/// - Whenever the counter map equals the last-known-remote snapshot,
///   the status is [`SyncStatus::Synced`] and the durable cache entry
///   is absent.
/// - Whenever they differ, the cache entry holds exactly the current
///   map, independent of any push attempt.
/// - At most one push is in flight; a new attempt starts only after the
///   previous one resolved and divergence was re-checked.
pub struct SyncEngine<S> {
    session: SessionId,
    counts: CounterMap,
    last_known_remote: Option<CounterMap>,
    status: SyncStatus,
    cache: SessionCache<S>,
    config: SyncConfig,
    timers: TimerSet,
    in_flight: Option<InFlight>,
    next_attempt: u64,
}

impl<S: KeyValueStore> SyncEngine<S> {
    /// Creates an engine from the outcome of [`crate::load_session`].
    ///
    /// If the loaded state already diverges from the remote snapshot (a
    /// cached copy won, template keys were materialized, or the remote
    /// was unreachable), the first push sequence begins immediately: the
    /// cache is brought up to date and the debounce timer is armed.
    pub fn new(
        loaded: LoadedSession,
        cache: SessionCache<S>,
        config: SyncConfig,
        now: Instant,
    ) -> Self {
        let mut engine = Self {
            session: loaded.session,
            counts: loaded.counts,
            last_known_remote: loaded.last_known_remote,
            status: SyncStatus::Synced,
            cache,
            config,
            timers: TimerSet::new(),
            in_flight: None,
            next_attempt: 0,
        };
        if engine.is_divergent() {
            engine.status = SyncStatus::Syncing;
            engine.cache.write(&engine.session, &engine.counts);
            engine
                .timers
                .arm(TimerKind::Debounce, now + engine.config.debounce_window);
        } else {
            engine.cache.clear(&engine.session);
        }
        engine
    }

    /// Returns the session this engine reconciles.
    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn counts(&self) -> &CounterMap {
        &self.counts
    }

    /// Returns the last remote-confirmed snapshot, if any.
    #[must_use]
    pub fn last_known_remote(&self) -> Option<&CounterMap> {
        self.last_known_remote.as_ref()
    }

    /// Returns the current sync status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        self.status
    }

    /// Returns true while local state differs from the last confirmed
    /// remote snapshot.
    ///
    /// Before the first confirmation there is no snapshot, so the state
    /// counts as divergent until a push succeeds.
    #[must_use]
    pub fn is_divergent(&self) -> bool {
        self.last_known_remote.as_ref() != Some(&self.counts)
    }

    /// Returns the earliest pending timer deadline, for drivers.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Applies one button press.
    pub fn touch(&mut self, button: &str, subtract: bool, now: Instant) {
        self.counts.touch(button, subtract);
        self.after_local_change(now);
    }

    /// Switches the active template, materializing missing counter keys
    /// with zero.
    ///
    /// Existing counts are preserved, so switching away and back never
    /// loses data.
    pub fn apply_template(&mut self, template: &Template, now: Instant) {
        if self.counts.materialize(template) {
            self.after_local_change(now);
        }
    }

    /// Advances all timers due at `now`.
    ///
    /// Returns a push to issue if one became due. `wall_clock_ms` is the
    /// current Unix time, captured into the push snapshot.
    pub fn poll_timers(&mut self, now: Instant, wall_clock_ms: u64) -> Option<PushRequest> {
        let mut request = None;
        for kind in self.timers.take_due(now) {
            match kind {
                TimerKind::PushDeadline => self.expire_in_flight(now),
                TimerKind::Debounce | TimerKind::Retry => {
                    if request.is_none() {
                        request = self.maybe_start_push(now, wall_clock_ms);
                    }
                }
            }
        }
        request
    }

    /// Records the outcome of a push attempt.
    ///
    /// Results for attempts already superseded by their deadline are
    /// ignored. On success the last-known-remote snapshot advances to
    /// the pushed snapshot and divergence is re-checked immediately: if
    /// edits landed during the round trip and their debounce window has
    /// already elapsed, the follow-up push is returned right away.
    pub fn complete_push(
        &mut self,
        attempt: PushAttemptId,
        result: SyncResult<()>,
        now: Instant,
        wall_clock_ms: u64,
    ) -> Option<PushRequest> {
        let Some(in_flight) = self.in_flight.take_if(|f| f.attempt == attempt) else {
            debug!(
                "ignoring result for superseded push attempt {} of {}",
                attempt.0, self.session
            );
            return None;
        };
        self.timers.cancel(TimerKind::PushDeadline);

        match result {
            Ok(()) => {
                debug!("push attempt {} for {} confirmed", attempt.0, self.session);
                self.last_known_remote = Some(in_flight.snapshot);
                if !self.is_divergent() {
                    self.mark_synced();
                    return None;
                }
                // Edits landed during the round trip. Wait out an open
                // debounce window; otherwise their window has already
                // elapsed and the follow-up push starts now.
                self.status = SyncStatus::Syncing;
                if self.timers.is_armed(TimerKind::Debounce) {
                    None
                } else {
                    self.maybe_start_push(now, wall_clock_ms)
                }
            }
            Err(err) => {
                warn!(
                    "push attempt {} for {} failed: {}",
                    attempt.0, self.session, err
                );
                self.handle_push_failure(now);
                None
            }
        }
    }

    fn after_local_change(&mut self, now: Instant) {
        if self.is_divergent() {
            self.cache.write(&self.session, &self.counts);
            self.timers
                .arm(TimerKind::Debounce, now + self.config.debounce_window);
            if self.status == SyncStatus::Synced {
                self.status = SyncStatus::Syncing;
            }
        } else {
            // The edit undid all divergence; nothing left to push.
            self.mark_synced();
        }
    }

    /// Treats the in-flight push as failed once its deadline passes.
    /// The eventual late response is ignored via its stale attempt id.
    fn expire_in_flight(&mut self, now: Instant) {
        if let Some(in_flight) = self.in_flight.take() {
            warn!(
                "push attempt {} for {} timed out",
                in_flight.attempt.0, self.session
            );
            self.handle_push_failure(now);
        }
    }

    fn handle_push_failure(&mut self, now: Instant) {
        if self.is_divergent() {
            self.status = SyncStatus::ErrorRetrying;
            self.timers
                .arm(TimerKind::Retry, now + self.config.retry_delay);
        } else {
            // Divergence disappeared while the attempt was out; the
            // failure is moot.
            self.mark_synced();
        }
    }

    fn maybe_start_push(&mut self, now: Instant, wall_clock_ms: u64) -> Option<PushRequest> {
        if self.in_flight.is_some() {
            // The resolution re-check picks up any remaining divergence.
            return None;
        }
        if !self.is_divergent() {
            self.mark_synced();
            return None;
        }

        let attempt = PushAttemptId(self.next_attempt);
        self.next_attempt += 1;
        let snapshot = self.counts.clone();
        self.in_flight = Some(InFlight {
            attempt,
            snapshot: snapshot.clone(),
        });
        self.status = SyncStatus::Syncing;
        self.timers.cancel(TimerKind::Retry);
        self.timers
            .arm(TimerKind::PushDeadline, now + self.config.push_timeout);
        debug!("starting push attempt {} for {}", attempt.0, self.session);

        Some(PushRequest {
            attempt,
            counts: snapshot,
            timestamp_ms: wall_clock_ms,
        })
    }

    fn mark_synced(&mut self) {
        self.status = SyncStatus::Synced;
        self.cache.clear(&self.session);
        self.timers.cancel(TimerKind::Debounce);
        self.timers.cancel(TimerKind::Retry);
    }
}
