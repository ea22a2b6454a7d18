//! Local undo/redo history.
//!
//! History is a linear list of entries with a cursor. Entries describe what
//! happened; replaying them against the store is the session's job, which
//! writes fresh ids and snapshots back into the entry through the `&mut`
//! returned by [`History::undo`] and [`History::redo`].

use crate::marks::{MarkData, MarkId, MarkKind};
use serde::{Deserialize, Serialize};

/// Maximum number of entries to keep.
pub const MAX_HISTORY: usize = 100;

/// A finalized user mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryEntry {
    /// A mark was created. `mark` is refreshed on undo so redo recreates the
    /// latest state.
    Add { id: MarkId, mark: MarkData },
    /// A mark was deleted. `mark` is the pre-delete snapshot.
    Delete { id: MarkId, mark: MarkData },
    /// A mark was changed.
    Update {
        id: MarkId,
        before: MarkData,
        after: MarkData,
    },
}

impl HistoryEntry {
    /// Id of the mark this entry currently refers to.
    pub fn id(&self) -> MarkId {
        match self {
            HistoryEntry::Add { id, .. }
            | HistoryEntry::Delete { id, .. }
            | HistoryEntry::Update { id, .. } => *id,
        }
    }

    /// Point the entry at a re-created mark.
    pub fn set_id(&mut self, new_id: MarkId) {
        match self {
            HistoryEntry::Add { id, .. }
            | HistoryEntry::Delete { id, .. }
            | HistoryEntry::Update { id, .. } => *id = new_id,
        }
    }

    pub fn mark_kind(&self) -> MarkKind {
        match self {
            HistoryEntry::Add { mark, .. } | HistoryEntry::Delete { mark, .. } => mark.kind(),
            HistoryEntry::Update { before, .. } => before.kind(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HistoryEntry::Add { .. } => "add",
            HistoryEntry::Delete { .. } => "delete",
            HistoryEntry::Update { .. } => "update",
        }
    }
}

/// Undo/redo stack with a cursor.
///
/// `cursor` counts the applied entries: entries before it can be undone, the
/// entries from it onwards can be redone.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(MAX_HISTORY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a new entry, discarding the redo branch.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor);
        self.entries.push(entry);
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len();
    }

    /// Step back. Returns the entry to revert.
    pub fn undo(&mut self) -> Option<&mut HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get_mut(self.cursor)
    }

    /// Step forward. Returns the entry to re-apply.
    pub fn redo(&mut self) -> Option<&mut HistoryEntry> {
        if self.cursor >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get_mut(self.cursor - 1)
    }

    /// Point every entry for `old` at `new` once a mark has been re-created.
    pub fn remap_id(&mut self, old: MarkId, new: MarkId) {
        for entry in &mut self.entries {
            if entry.id() == old {
                entry.set_id(new);
            }
        }
    }

    /// Undo a step whose replay failed.
    pub fn rollback_undo(&mut self) {
        self.cursor = (self.cursor + 1).min(self.entries.len());
    }

    /// Undo a step forward whose replay failed.
    pub fn rollback_redo(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Index of the last applied entry, `-1` when nothing is applied.
    pub fn index(&self) -> isize {
        self.cursor as isize - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
