//! In-memory mark store.

use super::{
    BoxFuture, ListenerRegistry, MarkStore, MarksListener, StoreError, StoreResult, Subscription,
    now_millis,
};
use crate::marks::{Mark, MarkData, MarkId, MarkPatch};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// In-memory store for tests, demos and the replay tool.
///
/// Listeners are notified synchronously after every write, before the write's
/// future resolves.
pub struct MemoryMarkStore {
    marks: RwLock<Vec<Mark>>,
    listeners: Arc<ListenerRegistry>,
}

impl Default for MemoryMarkStore {
    fn default() -> Self {
        Self::with_marks(Vec::new())
    }
}

impl MemoryMarkStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with existing marks.
    pub fn with_marks(marks: Vec<Mark>) -> Self {
        Self {
            marks: RwLock::new(marks),
            listeners: ListenerRegistry::new(),
        }
    }

    /// Current authoritative list.
    pub fn snapshot(&self) -> StoreResult<Vec<Mark>> {
        let marks = self
            .marks
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(marks.clone())
    }

    /// Apply an edit as if another viewer made it, then notify listeners.
    pub fn apply_remote<F>(&self, edit: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Vec<Mark>),
    {
        let snapshot = {
            let mut marks = self
                .marks
                .write()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            edit(&mut *marks);
            marks.clone()
        };
        log::debug!("Remote edit applied, {} marks", snapshot.len());
        self.listeners.notify(&snapshot);
        Ok(())
    }

    fn write<T>(&self, f: impl FnOnce(&mut Vec<Mark>) -> StoreResult<T>) -> StoreResult<T> {
        let (result, snapshot) = {
            let mut marks = self
                .marks
                .write()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            let result = f(&mut *marks)?;
            (result, marks.clone())
        };
        self.listeners.notify(&snapshot);
        Ok(result)
    }
}

impl MarkStore for MemoryMarkStore {
    fn add_mark(&self, data: MarkData) -> BoxFuture<'_, StoreResult<MarkId>> {
        Box::pin(async move {
            if !data.is_in_range() {
                return Err(StoreError::OutOfRange);
            }
            self.write(|marks| {
                let id = Uuid::new_v4();
                marks.push(Mark::new(id, now_millis(), data));
                Ok(id)
            })
        })
    }

    fn update_mark(&self, id: MarkId, patch: MarkPatch) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            if !patch.is_in_range() {
                return Err(StoreError::OutOfRange);
            }
            self.write(|marks| {
                let mark = marks
                    .iter_mut()
                    .find(|m| m.id == id)
                    .ok_or(StoreError::NotFound(id))?;
                mark.data.apply_patch(&patch)?;
                Ok(())
            })
        })
    }

    fn delete_mark(&self, id: MarkId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.write(|marks| {
                let index = marks
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or(StoreError::NotFound(id))?;
                marks.remove(index);
                Ok(())
            })
        })
    }

    fn subscribe(&self, listener: MarksListener) -> Subscription {
        if let Ok(marks) = self.snapshot() {
            listener(&marks);
        }
        self.listeners.add(listener)
    }
}
