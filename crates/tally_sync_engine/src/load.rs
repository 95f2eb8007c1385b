//! Initial session load: merging cached and remote state.

use crate::cache::SessionCache;
use crate::error::{SyncError, SyncResult};
use crate::gateway::SessionGateway;
use tally_core::{CounterMap, SessionId, Template};
use tally_storage::KeyValueStore;
use tracing::{debug, warn};

/// Outcome of [`load_session`]: the initial in-memory state for a session.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    /// The session this state belongs to.
    pub session: SessionId,
    /// Display name, when the remote was reachable.
    pub name: Option<String>,
    /// Initial counter map. Cached (not-yet-synced) edits win over the
    /// remote copy.
    pub counts: CounterMap,
    /// Remote snapshot the engine reconciles against. `None` when the
    /// remote was unreachable and state came from the cache alone.
    pub last_known_remote: Option<CounterMap>,
}

/// Loads the initial state for a session.
///
/// A durable cache entry represents not-yet-synced local edits and takes
/// precedence over the remote copy as the initial counter map. The
/// remote result still becomes the last-known-remote snapshot either
/// way, so a cache win is immediately visible as divergence and gets
/// pushed right after load. When the remote read fails, the cache alone
/// can carry the session.
///
/// The active template's keys are materialized into the initial map with
/// zero counts. This function never writes to the cache or the remote
/// store.
///
/// # Errors
///
/// - [`SyncError::SessionNotFound`] if the remote reports no such
///   session, or is unreachable and no cache entry exists.
/// - [`SyncError::Unauthorized`] is passed through; cached state never
///   satisfies an unauthorized read.
pub fn load_session<G, S>(
    gateway: &G,
    cache: &SessionCache<S>,
    session: &SessionId,
    template: &Template,
) -> SyncResult<LoadedSession>
where
    G: SessionGateway,
    S: KeyValueStore,
{
    let cached = cache.read(session);

    let record = match gateway.read_session(session) {
        Ok(Some(record)) => record,
        Ok(None) => return Err(SyncError::SessionNotFound),
        Err(err @ SyncError::Unauthorized(_)) => return Err(err),
        Err(err) => {
            let Some(mut counts) = cached else {
                warn!("remote read failed for {} with no cached state: {}", session, err);
                return Err(SyncError::SessionNotFound);
            };
            warn!("remote read failed for {}, resuming from cached state: {}", session, err);
            counts.materialize(template);
            return Ok(LoadedSession {
                session: session.clone(),
                name: None,
                counts,
                last_known_remote: None,
            });
        }
    };

    if cached.is_some() {
        debug!("cached edits for {} take precedence over remote counts", session);
    }
    let mut counts = cached.unwrap_or_else(|| record.counts.clone());
    counts.materialize(template);

    Ok(LoadedSession {
        session: session.clone(),
        name: Some(record.name),
        counts,
        last_known_remote: Some(record.counts),
    })
}
