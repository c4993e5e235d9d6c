//! Per-group "opened/sent" bookkeeping.

use std::collections::HashSet;

use mailmerge_core::JoinKey;
use serde::Serialize;

use crate::draft::Draft;

/// Tracks which groups the caller has dispatched.
///
/// Only keys known at construction can be marked; anything else is rejected
/// so `remaining` can never go negative or drift from the draft list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchTracker {
    keys: Vec<JoinKey>,
    known: HashSet<JoinKey>,
    dispatched: HashSet<JoinKey>,
}

/// Counts shown next to the draft list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchProgress {
    pub total: usize,
    pub dispatched: usize,
    pub remaining: usize,
}

impl DispatchTracker {
    pub fn new<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = JoinKey>,
    {
        let mut tracker = Self::default();
        for key in keys {
            if tracker.known.insert(key.clone()) {
                tracker.keys.push(key);
            }
        }
        tracker
    }

    pub fn for_drafts(drafts: &[Draft]) -> Self {
        Self::new(drafts.iter().map(|d| d.group_key.clone()))
    }

    /// Returns `false` for keys this tracker does not know. Marking twice is a no-op.
    pub fn mark_dispatched(&mut self, key: &JoinKey) -> bool {
        if !self.known.contains(key) {
            return false;
        }
        self.dispatched.insert(key.clone());
        true
    }

    pub fn is_dispatched(&self, key: &JoinKey) -> bool {
        self.dispatched.contains(key)
    }

    pub fn total(&self) -> usize {
        self.keys.len()
    }

    pub fn dispatched_count(&self) -> usize {
        self.dispatched.len()
    }

    pub fn remaining(&self) -> usize {
        self.total() - self.dispatched_count()
    }

    /// Keys not yet dispatched, in draft order.
    pub fn pending(&self) -> impl Iterator<Item = &JoinKey> {
        self.keys.iter().filter(|k| !self.dispatched.contains(*k))
    }

    pub fn progress(&self) -> DispatchProgress {
        DispatchProgress {
            total: self.total(),
            dispatched: self.dispatched_count(),
            remaining: self.remaining(),
        }
    }

    /// Forget every mark, keeping the known keys.
    pub fn reset(&mut self) {
        self.dispatched.clear();
    }
}
