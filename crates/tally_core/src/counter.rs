//! Per-session counter state.

use crate::template::Template;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A mapping from counter identifier to a non-negative count.
///
/// This is the single source of user-facing truth during a session.
/// Counts never go negative: decrementing a zero count leaves it at zero.
///
/// Equality is structural over the full key set; the sync layer compares
/// whole maps to decide whether local state has diverged from the remote
/// store, so a key materialized with an explicit zero is *not* equal to an
/// absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterMap {
    counts: BTreeMap<String, u64>,
}

impl CounterMap {
    /// Creates an empty counter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count for a counter, treating an absent entry as zero.
    #[must_use]
    pub fn get(&self, id: &str) -> u64 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Returns true if the counter has been materialized.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.counts.contains_key(id)
    }

    /// Applies one button press.
    ///
    /// Increments the counter, or decrements it in subtract mode. An
    /// absent entry is treated as zero and materialized by the press;
    /// decrementing a zero count leaves it at zero.
    pub fn touch(&mut self, id: &str, subtract: bool) {
        let entry = self.counts.entry(id.to_string()).or_insert(0);
        *entry = if subtract {
            entry.saturating_sub(1)
        } else {
            *entry + 1
        };
    }

    /// Materializes every button key of `template` that is absent, with a
    /// zero count.
    ///
    /// Existing entries are never removed or altered, so counts for
    /// buttons outside the current template survive a template switch and
    /// back.
    ///
    /// Returns true if any key was inserted.
    pub fn materialize(&mut self, template: &Template) -> bool {
        let mut changed = false;
        for button in template.buttons() {
            if !self.counts.contains_key(button.key()) {
                self.counts.insert(button.key().to_string(), 0);
                changed = true;
            }
        }
        changed
    }

    /// Returns the number of materialized counters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no counter has been materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterates over counter identifiers and counts.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for CounterMap {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
