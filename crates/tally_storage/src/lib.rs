//! # Tally Storage
//!
//! String-keyed, string-valued store backends for Tally.
//!
//! This crate provides:
//! - `KeyValueStore` trait for opaque string persistence
//! - `MemoryStore` for tests and ephemeral sessions
//! - `FileStore` for durable on-disk sessions
//!
//! Stores are pure persistence: they hold exactly the strings they are
//! given and never interpret values. All encoding and cache lifecycle
//! logic lives in `tally_sync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::KeyValueStore;
