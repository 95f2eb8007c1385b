//! # Tally Core
//!
//! Domain types for Tally counter sessions.
//!
//! This crate provides:
//! - `CounterMap` for per-session button counts
//! - `SessionId` for naming counter sessions
//! - `Template` definitions for button layouts
//!
//! All types here are pure in-memory data; persistence and remote
//! reconciliation live in `tally_storage` and `tally_sync_engine`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod counter;
mod session;
mod template;

pub use counter::CounterMap;
pub use session::SessionId;
pub use template::{builtin_templates, default_template, Template, TemplateButton};
