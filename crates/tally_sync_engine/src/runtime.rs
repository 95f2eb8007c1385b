//! Thread-backed driver giving the engine real timers and real pushes.

use crate::engine::{PushAttemptId, PushRequest, SyncEngine, SyncStatus};
use crate::error::SyncResult;
use crate::gateway::SessionGateway;
use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tally_core::{CounterMap, SessionId, Template};
use tally_storage::KeyValueStore;

/// Events processed by the driver loop.
enum Event {
    Touch { button: String, subtract: bool },
    ApplyTemplate(Template),
    PushResolved {
        attempt: PushAttemptId,
        result: SyncResult<()>,
    },
    Shutdown,
}

/// Read view shared with the UI layer.
struct SharedView {
    counts: RwLock<CounterMap>,
    status: RwLock<SyncStatus>,
}

/// Handle to a running session sync loop.
///
/// The loop owns a [`SyncEngine`] and drives it with real time: button
/// presses and template switches are forwarded as events, timers fire
/// through `recv_timeout` bounded by the engine's next deadline, and
/// each push attempt runs on its own worker thread so a slow remote
/// never blocks local edits.
///
/// Dropping the handle (or calling [`SessionSyncHandle::shutdown`])
/// stops the loop and cancels pending timers. In-flight pushes are not
/// aborted and the durable cache is left as-is, so re-entering the
/// session resumes from persisted state.
pub struct SessionSyncHandle {
    tx: Sender<Event>,
    shared: Arc<SharedView>,
    join: Option<JoinHandle<()>>,
}

impl SessionSyncHandle {
    /// Starts the sync loop for a loaded engine.
    pub fn spawn<S, G>(engine: SyncEngine<S>, gateway: Arc<G>) -> Self
    where
        S: KeyValueStore + 'static,
        G: SessionGateway + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(SharedView {
            counts: RwLock::new(engine.counts().clone()),
            status: RwLock::new(engine.status()),
        });

        let loop_tx = tx.clone();
        let loop_shared = Arc::clone(&shared);
        let join = thread::spawn(move || run_loop(engine, gateway, rx, loop_tx, loop_shared));

        Self {
            tx,
            shared,
            join: Some(join),
        }
    }

    /// Applies one button press.
    pub fn touch(&self, button: impl Into<String>, subtract: bool) {
        let _ = self.tx.send(Event::Touch {
            button: button.into(),
            subtract,
        });
    }

    /// Switches the active template.
    pub fn apply_template(&self, template: Template) {
        let _ = self.tx.send(Event::ApplyTemplate(template));
    }

    /// Returns the current counter values.
    #[must_use]
    pub fn counts(&self) -> CounterMap {
        self.shared.counts.read().clone()
    }

    /// Returns the current sync status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.shared.status.read()
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// Pending timers are cancelled. In-flight pushes keep running to
    /// completion on their worker threads, and the durable cache is
    /// never cleared on teardown.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.tx.send(Event::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for SessionSyncHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop<S, G>(
    mut engine: SyncEngine<S>,
    gateway: Arc<G>,
    rx: Receiver<Event>,
    tx: Sender<Event>,
    shared: Arc<SharedView>,
) where
    S: KeyValueStore + 'static,
    G: SessionGateway + 'static,
{
    loop {
        let event = match engine.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match rx.recv_timeout(timeout) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(event) => Some(event),
                Err(_) => break,
            },
        };

        let now = Instant::now();
        let mut request = match event {
            Some(Event::Touch { button, subtract }) => {
                engine.touch(&button, subtract, now);
                None
            }
            Some(Event::ApplyTemplate(template)) => {
                engine.apply_template(&template, now);
                None
            }
            Some(Event::PushResolved { attempt, result }) => {
                engine.complete_push(attempt, result, now, unix_millis())
            }
            Some(Event::Shutdown) => break,
            None => None,
        };
        if request.is_none() {
            request = engine.poll_timers(now, unix_millis());
        }

        if let Some(request) = request {
            issue_push(&gateway, &tx, engine.session().clone(), request);
        }

        *shared.counts.write() = engine.counts().clone();
        *shared.status.write() = engine.status();
    }
}

/// Fires a push on its own worker thread.
///
/// The worker does not hold the loop open: a push resolving after
/// session teardown simply has nowhere to report to.
fn issue_push<G: SessionGateway + 'static>(
    gateway: &Arc<G>,
    tx: &Sender<Event>,
    session: SessionId,
    request: PushRequest,
) {
    let gateway = Arc::clone(gateway);
    let tx = tx.clone();
    thread::spawn(move || {
        let result = gateway.update_session(&session, &request.counts, Some(request.timestamp_ms));
        let _ = tx.send(Event::PushResolved {
            attempt: request.attempt,
            result,
        });
    });
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SessionCache;
    use crate::config::{SyncConfig, DEFAULT_CACHE_KEY_PREFIX};
    use crate::gateway::MockGateway;
    use crate::load::load_session;
    use std::time::Duration;
    use tally_core::default_template;
    use tally_storage::MemoryStore;

    fn fast_config() -> SyncConfig {
        SyncConfig::new()
            .with_debounce_window(Duration::from_millis(20))
            .with_push_timeout(Duration::from_millis(500))
            .with_retry_delay(Duration::from_millis(40))
    }

    fn wait_until(what: &str, condition: impl Fn() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!("timed out waiting for {what}");
    }

    fn start(
        gateway: &Arc<MockGateway>,
        store: &Arc<MemoryStore>,
    ) -> SessionSyncHandle {
        let session = SessionId::new("s1");
        let cache = SessionCache::new(Arc::clone(store), DEFAULT_CACHE_KEY_PREFIX);
        let loaded = load_session(gateway.as_ref(), &cache, &session, &default_template()).unwrap();
        let engine = SyncEngine::new(loaded, cache, fast_config(), Instant::now());
        SessionSyncHandle::spawn(engine, Arc::clone(gateway))
    }

    fn synced_remote() -> CounterMap {
        // All default-template keys present, so a fresh load starts synced
        let mut counts = CounterMap::new();
        counts.materialize(&default_template());
        counts
    }

    #[test]
    fn presses_are_pushed_once_quiescent() {
        let gateway = Arc::new(MockGateway::new());
        gateway.insert_session(SessionId::new("s1"), "s", synced_remote());
        let store = Arc::new(MemoryStore::new());

        let handle = start(&gateway, &store);
        assert!(handle.status().is_synced());

        handle.touch("button1", false);
        handle.touch("button1", false);
        handle.touch("button2", false);

        wait_until("push to be confirmed", || {
            gateway.push_count() >= 1 && handle.status().is_synced()
        });

        let remote = gateway.remote_counts(&SessionId::new("s1")).unwrap();
        assert_eq!(remote.get("button1"), 2);
        assert_eq!(remote.get("button2"), 1);
        assert_eq!(handle.counts(), remote);
        // Everything confirmed, so the durable cache entry is gone
        wait_until("cache to clear", || store.is_empty());

        handle.shutdown();
    }

    #[test]
    fn failed_push_recovers_through_retry() {
        let gateway = Arc::new(MockGateway::new());
        gateway.insert_session(SessionId::new("s1"), "s", synced_remote());
        gateway.queue_update_error(crate::SyncError::transport_retryable("offline"));
        let store = Arc::new(MemoryStore::new());

        let handle = start(&gateway, &store);
        handle.touch("button1", false);

        // The retry goes through once the queued failure is consumed
        wait_until("retry to succeed", || handle.status().is_synced());
        assert_eq!(
            gateway
                .remote_counts(&SessionId::new("s1"))
                .unwrap()
                .get("button1"),
            1
        );

        handle.shutdown();
    }

    #[test]
    fn teardown_keeps_unsynced_state_in_cache() {
        let gateway = Arc::new(MockGateway::new());
        gateway.insert_session(SessionId::new("s1"), "s", synced_remote());
        let store = Arc::new(MemoryStore::new());

        let handle = start(&gateway, &store);
        // Every attempt fails while the user keeps tapping
        for _ in 0..10 {
            gateway.queue_update_error(crate::SyncError::transport_retryable("offline"));
        }
        handle.touch("button1", false);

        wait_until("engine to enter error state", || handle.status().is_error());
        handle.shutdown();

        // The edit survived teardown in the durable cache
        let cache = SessionCache::new(Arc::clone(&store), DEFAULT_CACHE_KEY_PREFIX);
        let cached = cache.read(&SessionId::new("s1")).unwrap();
        assert_eq!(cached.get("button1"), 1);
    }
}
