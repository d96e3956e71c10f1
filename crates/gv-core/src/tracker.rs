//! Transient per-row visual states
//!
//! Adds, updates and deletes leave a one-shot mark keyed by track identity.
//! The windowing refresh consumes a mark the first time it materializes the
//! row, so each change is announced at most once.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::record::{Record, TrackKey};

/// Colour tokens used for change highlights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    /// Background for updated rows
    pub default: String,
    /// Text colour for updated rows
    pub default_color: Option<String>,
    pub add: String,
    pub add_color: Option<String>,
    pub delete: String,
    pub delete_color: Option<String>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            default: "yellow".to_string(),
            default_color: None,
            add: "green".to_string(),
            add_color: Some("white".to_string()),
            delete: "red".to_string(),
            delete_color: Some("white".to_string()),
        }
    }
}

/// Kind of change a row went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeStatus {
    #[serde(rename = "add")]
    Added,
    #[serde(rename = "upd")]
    Updated,
    #[serde(rename = "del")]
    Deleted,
}

/// Pending highlight for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualState {
    pub highlight_color: String,
    pub text_color: Option<String>,
    pub status: ChangeStatus,
}

/// One-shot visual states keyed by track identity
#[derive(Debug, Default)]
pub struct ChangeTracker {
    states: AHashMap<TrackKey, VisualState>,
    scheme: ColorScheme,
    /// Marks recorded since the last invalidate
    pending: usize,
}

impl ChangeTracker {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            states: AHashMap::new(),
            scheme,
            pending: 0,
        }
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.scheme
    }

    pub fn set_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }

    /// Record a mark for `key`, replacing any earlier one
    pub fn mark(&mut self, key: TrackKey, status: ChangeStatus) {
        let (highlight, text) = match status {
            ChangeStatus::Added => (&self.scheme.add, &self.scheme.add_color),
            ChangeStatus::Updated => (&self.scheme.default, &self.scheme.default_color),
            ChangeStatus::Deleted => (&self.scheme.delete, &self.scheme.delete_color),
        };
        let state = VisualState {
            highlight_color: highlight.clone(),
            text_color: text.clone(),
            status,
        };
        self.states.insert(key, state);
        self.pending += 1;
    }

    pub fn mark_added<I: IntoIterator<Item = TrackKey>>(&mut self, keys: I) {
        keys.into_iter().for_each(|key| self.mark(key, ChangeStatus::Added));
    }

    pub fn mark_updated<I: IntoIterator<Item = TrackKey>>(&mut self, keys: I) {
        keys.into_iter().for_each(|key| self.mark(key, ChangeStatus::Updated));
    }

    pub fn mark_deleted<I: IntoIterator<Item = TrackKey>>(&mut self, keys: I) {
        keys.into_iter().for_each(|key| self.mark(key, ChangeStatus::Deleted));
    }

    /// Read a mark without consuming it
    pub fn peek(&self, key: &TrackKey) -> Option<&VisualState> {
        self.states.get(key)
    }

    /// Read and remove the mark for `key`
    pub fn consume(&mut self, key: &TrackKey) -> Option<VisualState> {
        self.states.remove(key)
    }

    /// Drop marks whose rows are no longer in the collection
    pub fn retain_keys(&mut self, live: &AHashSet<TrackKey>) {
        self.states.retain(|key, _| live.contains(key));
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn pending_changes(&self) -> usize {
        self.pending
    }

    /// Reset the pending counter, returning its previous value
    pub fn take_pending(&mut self) -> usize {
        std::mem::take(&mut self.pending)
    }
}

/// Result of reconciling incoming records against a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert<R> {
    /// New collection: untouched existing rows followed by the incoming rows
    pub items: Vec<R>,
    pub added: Vec<TrackKey>,
    pub updated: Vec<TrackKey>,
}

/// Insert or replace `incoming` records by track identity
pub fn upsert_by_identity<R: Record>(existing: &[R], incoming: Vec<R>, track_field: &str) -> Upsert<R> {
    let mut positions: AHashMap<TrackKey, Vec<usize>> = AHashMap::new();
    for (index, item) in existing.iter().enumerate() {
        positions.entry(TrackKey::of(item, track_field)).or_default().push(index);
    }

    let mut replaced = vec![false; existing.len()];
    let mut added = Vec::new();
    let mut updated = Vec::new();
    for item in &incoming {
        let key = TrackKey::of(item, track_field);
        let slot = positions
            .get(&key)
            .and_then(|indices| indices.iter().copied().find(|&i| !replaced[i]));
        match slot {
            Some(index) => {
                replaced[index] = true;
                updated.push(key);
            }
            None => added.push(key),
        }
    }

    let mut items: Vec<R> = existing
        .iter()
        .zip(replaced)
        .filter(|(_, replaced)| !replaced)
        .map(|(item, _)| item.clone())
        .collect();
    items.extend(incoming);

    Upsert { items, added, updated }
}

/// Collection without the records whose identity is in `keys`
pub fn remove_by_identity<R: Record>(existing: &[R], keys: &AHashSet<TrackKey>, track_field: &str) -> Vec<R> {
    existing
        .iter()
        .filter(|item| !keys.contains(&TrackKey::of(*item, track_field)))
        .cloned()
        .collect()
}
