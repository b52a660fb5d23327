use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::outcome::Maybe;

// ============================================================================
// WatchedList - Change Tracking Against a Baseline
// ============================================================================
//
// Remembers the membership it was constructed with and reports added/removed
// deltas, so repositories can persist only what changed. Adding cancels a
// prior removal and removing cancels a prior addition; an item is never in
// both logs at once. Item comparison goes through `PartialEq`, which for
// entities means identity comparison.
//
// ============================================================================

/// Collection that diffs its current membership against a baseline snapshot.
#[derive(Debug, Clone)]
pub struct WatchedList<T> {
    initial: Vec<T>,
    current: Vec<T>,
    added: Vec<T>,
    removed: Vec<T>,
}

impl<T> Default for WatchedList<T> {
    fn default() -> Self {
        Self {
            initial: Vec::new(),
            current: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> WatchedList<T> {
    /// Construct from an initial snapshot: the baseline, with no deltas.
    pub fn new(initial: Vec<T>) -> Self {
        Self {
            current: initial.clone(),
            initial,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The visible membership. A defensive copy: mutating the returned vec
    /// never affects the list.
    pub fn items(&self) -> Vec<T> {
        self.current.clone()
    }

    /// Items added since construction. Defensive copy.
    pub fn new_items(&self) -> Vec<T> {
        self.added.clone()
    }

    /// Items removed since construction. Defensive copy.
    pub fn removed_items(&self) -> Vec<T> {
        self.removed.clone()
    }

    fn is_current(&self, item: &T) -> bool {
        self.current.iter().any(|existing| existing == item)
    }

    fn was_added(&self, item: &T) -> bool {
        self.added.iter().any(|existing| existing == item)
    }

    fn was_removed(&self, item: &T) -> bool {
        self.removed.iter().any(|existing| existing == item)
    }

    /// Make `item` visible.
    ///
    /// A no-op when an equal item is already visible. Re-adding an item whose
    /// removal is logged un-records the removal instead of logging an
    /// addition, so the net diff against the baseline is "no change".
    pub fn add(&mut self, item: T) {
        if self.is_current(&item) {
            return;
        }

        if self.was_removed(&item) {
            self.removed.retain(|existing| existing != &item);
            self.current.push(item);
            return;
        }

        self.added.push(item.clone());
        self.current.push(item);
    }

    /// Remove `item` from the visible set, recording the removal intent.
    ///
    /// Removing a newly-added item just un-does the addition; the removed log
    /// stays untouched. Removing an item that is not visible is still
    /// recorded.
    pub fn remove(&mut self, item: &T) {
        self.current.retain(|existing| existing != item);

        if self.was_added(item) {
            self.added.retain(|existing| existing != item);
            return;
        }

        if !self.was_removed(item) {
            self.removed.push(item.clone());
        }
    }

    pub fn exists(&self, item: &T) -> bool {
        self.is_current(item)
    }

    /// First visible item matching `predicate`.
    pub fn find<F>(&self, predicate: F) -> Maybe<T>
    where
        F: Fn(&T) -> bool,
    {
        self.current
            .iter()
            .find(|item| predicate(item))
            .cloned()
            .into()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Whether anything differs from the baseline.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }

    /// The baseline the list was constructed with. Defensive copy.
    pub fn initial_items(&self) -> Vec<T> {
        self.initial.clone()
    }
}

impl<T: Clone + PartialEq + Serialize> WatchedList<T> {
    /// Serialize each visible item through its serde impl, the same policy
    /// entity serialization uses for nested values.
    pub fn to_values(&self) -> Result<Vec<Value>> {
        self.current
            .iter()
            .map(|item| serde_json::to_value(item).context("failed to serialize watched item"))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
