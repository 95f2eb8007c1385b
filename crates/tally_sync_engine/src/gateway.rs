//! Remote session gateway abstraction.

use crate::error::{SyncError, SyncResult};
use std::collections::HashMap;
use std::sync::Mutex;
use tally_core::{CounterMap, SessionId};

/// A named remote counter session as served by the session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Display name of the session.
    pub name: String,
    /// Counter values currently stored on the remote.
    pub counts: CounterMap,
}

impl SessionRecord {
    /// Creates a session record.
    #[must_use]
    pub fn new(name: impl Into<String>, counts: CounterMap) -> Self {
        Self {
            name: name.into(),
            counts,
        }
    }
}

/// Access to the authoritative remote counter store.
///
/// This trait abstracts the session layer's RPC surface, allowing for
/// different implementations (HTTP actions, mock for testing, etc.).
///
/// The remote store is passive: `update_session` replaces the stored
/// counts wholesale. The optional client timestamp lets the store run
/// its own ordering and idempotency checks; the engine supplies it but
/// never interprets its effect.
pub trait SessionGateway: Send + Sync {
    /// Reads the current remote state of a session.
    ///
    /// Returns `None` if the session does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unauthorized`] if the caller's identity
    /// cannot access the session, or a transport error if the remote is
    /// unreachable.
    fn read_session(&self, session: &SessionId) -> SyncResult<Option<SessionRecord>>;

    /// Replaces the remote counts for a session.
    ///
    /// Idempotent when `counts` equals the last applied write.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unauthorized`], [`SyncError::SessionNotFound`],
    /// or a transport error.
    fn update_session(
        &self,
        session: &SessionId,
        counts: &CounterMap,
        timestamp_ms: Option<u64>,
    ) -> SyncResult<()>;
}

/// A push received by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    /// Session the push targeted.
    pub session: SessionId,
    /// Pushed counter snapshot.
    pub counts: CounterMap,
    /// Client timestamp supplied with the push.
    pub timestamp_ms: Option<u64>,
}

/// A mock gateway for testing.
///
/// Serves scripted sessions, records every successful push, and fails
/// reads or updates with queued errors, one per call.
#[derive(Debug, Default)]
pub struct MockGateway {
    records: Mutex<HashMap<SessionId, SessionRecord>>,
    read_errors: Mutex<Vec<SyncError>>,
    update_errors: Mutex<Vec<SyncError>>,
    pushes: Mutex<Vec<RecordedPush>>,
}

impl MockGateway {
    /// Creates a new mock gateway with no sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves a session with the given name and counts.
    pub fn insert_session(&self, session: SessionId, name: impl Into<String>, counts: CounterMap) {
        self.records
            .lock()
            .unwrap()
            .insert(session, SessionRecord::new(name, counts));
    }

    /// Queues an error for the next `read_session` call.
    pub fn queue_read_error(&self, error: SyncError) {
        self.read_errors.lock().unwrap().push(error);
    }

    /// Queues an error for the next `update_session` call.
    pub fn queue_update_error(&self, error: SyncError) {
        self.update_errors.lock().unwrap().push(error);
    }

    /// Returns all recorded pushes in arrival order.
    pub fn pushes(&self) -> Vec<RecordedPush> {
        self.pushes.lock().unwrap().clone()
    }

    /// Returns the number of recorded pushes.
    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    /// Returns the counts currently stored for a session.
    pub fn remote_counts(&self, session: &SessionId) -> Option<CounterMap> {
        self.records
            .lock()
            .unwrap()
            .get(session)
            .map(|record| record.counts.clone())
    }
}

impl SessionGateway for MockGateway {
    fn read_session(&self, session: &SessionId) -> SyncResult<Option<SessionRecord>> {
        if let Some(error) = self.read_errors.lock().unwrap().pop() {
            return Err(error);
        }
        Ok(self.records.lock().unwrap().get(session).cloned())
    }

    fn update_session(
        &self,
        session: &SessionId,
        counts: &CounterMap,
        timestamp_ms: Option<u64>,
    ) -> SyncResult<()> {
        if let Some(error) = self.update_errors.lock().unwrap().pop() {
            return Err(error);
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(session)
            .ok_or(SyncError::SessionNotFound)?;
        record.counts = counts.clone();
        drop(records);

        self.pushes.lock().unwrap().push(RecordedPush {
            session: session.clone(),
            counts: counts.clone(),
            timestamp_ms,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionId {
        SessionId::new("s1")
    }

    #[test]
    fn mock_serves_inserted_sessions() {
        let gateway = MockGateway::new();
        gateway.insert_session(session(), "Stream night", CounterMap::new());

        let record = gateway.read_session(&session()).unwrap().unwrap();
        assert_eq!(record.name, "Stream night");

        assert_eq!(
            gateway.read_session(&SessionId::new("other")).unwrap(),
            None
        );
    }

    #[test]
    fn mock_queued_read_error_fires_once() {
        let gateway = MockGateway::new();
        gateway.insert_session(session(), "s", CounterMap::new());
        gateway.queue_read_error(SyncError::transport_retryable("offline"));

        assert!(gateway.read_session(&session()).is_err());
        assert!(gateway.read_session(&session()).unwrap().is_some());
    }

    #[test]
    fn mock_update_applies_and_records() {
        let gateway = MockGateway::new();
        gateway.insert_session(session(), "s", CounterMap::new());

        let counts: CounterMap = [("button1", 2u64)].into_iter().collect();
        gateway
            .update_session(&session(), &counts, Some(1234))
            .unwrap();

        assert_eq!(gateway.remote_counts(&session()), Some(counts.clone()));
        let pushes = gateway.pushes();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].counts, counts);
        assert_eq!(pushes[0].timestamp_ms, Some(1234));
    }

    #[test]
    fn mock_update_unknown_session_fails() {
        let gateway = MockGateway::new();
        let result = gateway.update_session(&session(), &CounterMap::new(), None);
        assert!(matches!(result, Err(SyncError::SessionNotFound)));
        assert_eq!(gateway.push_count(), 0);
    }

    #[test]
    fn mock_queued_update_error_is_not_recorded() {
        let gateway = MockGateway::new();
        gateway.insert_session(session(), "s", CounterMap::new());
        gateway.queue_update_error(SyncError::Timeout);

        assert!(gateway
            .update_session(&session(), &CounterMap::new(), None)
            .is_err());
        assert_eq!(gateway.push_count(), 0);
    }
}
