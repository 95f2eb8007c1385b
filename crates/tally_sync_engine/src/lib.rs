//! # Tally Sync Engine
//!
//! Offline-first reconciliation engine for Tally counter sessions.
//!
//! This crate provides:
//! - Session load sequencing (durable cache + remote merge)
//! - Write-through durable caching of unsynced edits
//! - Debounced push scheduling with a per-attempt timeout
//! - Fixed-delay retry after failed pushes
//! - A deterministic state machine core and a thread-backed runtime
//!
//! ## Architecture
//!
//! The engine implements a **local-first, push-only** model:
//! 1. Button presses mutate local state immediately
//! 2. Divergent state is persisted to the durable cache before any push
//! 3. After a quiescence window, the full counter map replaces the
//!    remote copy
//!
//! The remote store is authoritative between sessions; within a session,
//! local state is the source of truth and is never rolled back by a
//! failed push.
//!
//! ## Key Invariants
//!
//! - Local state equals the last confirmed remote snapshot exactly when
//!   the status is `Synced` and the cache entry is absent
//! - Divergent state is always present in the durable cache
//! - At most one push is in flight per session
//! - A failed or timed-out push never loses local edits

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod engine;
mod error;
mod gateway;
mod load;
mod runtime;
mod timer;

pub use cache::SessionCache;
pub use config::{SyncConfig, DEFAULT_CACHE_KEY_PREFIX};
pub use engine::{PushAttemptId, PushRequest, SyncEngine, SyncStatus};
pub use error::{SyncError, SyncResult};
pub use gateway::{MockGateway, RecordedPush, SessionGateway, SessionRecord};
pub use load::{load_session, LoadedSession};
pub use runtime::SessionSyncHandle;
pub use timer::{TimerKind, TimerSet};
