//! Durable cache adapter for unsynced counter state.

use std::sync::Arc;
use tally_core::{CounterMap, SessionId};
use tally_storage::KeyValueStore;
use tracing::warn;

/// Session-scoped durable cache of not-yet-synced counter state.
///
/// The cache holds exactly the current counter map while it differs from
/// the last remote-confirmed snapshot, and nothing otherwise; the sync
/// engine is the sole writer for its session's key. Entries are plain
/// JSON objects under `{prefix}{session_id}`, so any string store can
/// hold them.
///
/// The cache must never take a session down: a malformed or unreadable
/// entry reads as absent, and write or clear failures are logged and
/// swallowed.
pub struct SessionCache<S> {
    store: Arc<S>,
    prefix: String,
}

impl<S: KeyValueStore> SessionCache<S> {
    /// Creates a cache adapter over `store` using the given key prefix.
    pub fn new(store: Arc<S>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Returns the store key for a session.
    #[must_use]
    pub fn key(&self, session: &SessionId) -> String {
        format!("{}{}", self.prefix, session)
    }

    /// Reads the cached counter map for a session, if present and intact.
    pub fn read(&self, session: &SessionId) -> Option<CounterMap> {
        let raw = match self.store.get(&self.key(session)) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!("failed to read cached counts for {}: {}", session, err);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(counts) => Some(counts),
            Err(err) => {
                warn!("discarding malformed cache entry for {}: {}", session, err);
                None
            }
        }
    }

    /// Writes the current counter map for a session.
    pub fn write(&self, session: &SessionId, counts: &CounterMap) {
        let raw = match serde_json::to_string(counts) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("failed to encode counts for {}: {}", session, err);
                return;
            }
        };
        if let Err(err) = self.store.set(&self.key(session), &raw) {
            warn!("failed to persist counts for {}: {}", session, err);
        }
    }

    /// Removes the cached entry for a session.
    pub fn clear(&self, session: &SessionId) {
        if let Err(err) = self.store.remove(&self.key(session)) {
            warn!("failed to clear cached counts for {}: {}", session, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CACHE_KEY_PREFIX;
    use tally_storage::MemoryStore;

    fn cache(store: Arc<MemoryStore>) -> SessionCache<MemoryStore> {
        SessionCache::new(store, DEFAULT_CACHE_KEY_PREFIX)
    }

    #[test]
    fn write_read_clear_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(Arc::clone(&store));
        let session = SessionId::new("s1");
        let counts: CounterMap = [("button1", 3u64)].into_iter().collect();

        cache.write(&session, &counts);
        assert_eq!(cache.read(&session), Some(counts));

        cache.clear(&session);
        assert_eq!(cache.read(&session), None);
        assert!(store.is_empty());
    }

    #[test]
    fn entries_are_keyed_by_session() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(Arc::clone(&store));

        let a: CounterMap = [("x", 1u64)].into_iter().collect();
        let b: CounterMap = [("x", 2u64)].into_iter().collect();
        cache.write(&SessionId::new("a"), &a);
        cache.write(&SessionId::new("b"), &b);

        assert_eq!(cache.read(&SessionId::new("a")), Some(a));
        assert_eq!(cache.read(&SessionId::new("b")), Some(b));
    }

    #[test]
    fn key_uses_prefix() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(Arc::clone(&store));
        let session = SessionId::new("abc123");

        cache.write(&session, &CounterMap::new());
        assert!(store.snapshot().contains_key("voice-counter-abc123"));
    }

    #[test]
    fn malformed_entry_reads_as_absent() {
        let store = Arc::new(MemoryStore::with_entries([(
            "voice-counter-s1",
            "not json at all",
        )]));
        let cache = cache(store);
        assert_eq!(cache.read(&SessionId::new("s1")), None);
    }

    #[test]
    fn missing_entry_reads_as_absent() {
        let store = Arc::new(MemoryStore::new());
        let cache = cache(store);
        assert_eq!(cache.read(&SessionId::new("nope")), None);
    }
}
