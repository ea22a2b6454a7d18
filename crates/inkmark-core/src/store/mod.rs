//! Persistence seam for marks.
//!
//! The editing engine never owns the authoritative mark list. It writes through
//! a [`MarkStore`] and learns about the result (and about other viewers'
//! edits) through a subscription.

mod crdt;
mod memory;

pub use crdt::{CrdtMarkStore, MARKS_KEY, ORDER_KEY};
pub use memory::MemoryMarkStore;

use crate::marks::{Mark, MarkData, MarkId, MarkPatch, PatchError};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use thiserror::Error;

// Use web-time on WASM, std::time otherwise
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};
#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Mark not found: {0}")]
    NotFound(MarkId),
    #[error(transparent)]
    TypeMismatch(#[from] PatchError),
    #[error("Coordinates outside the unit square")]
    OutOfRange,
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Lock error: {0}")]
    Lock(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Callback receiving the full authoritative mark list.
pub type MarksListener = Box<dyn Fn(&[Mark]) + Send + Sync>;

/// Trait for mark persistence backends.
///
/// Listeners receive the current list once on subscription and again after
/// every change, local or remote, in display order.
pub trait MarkStore: Send + Sync {
    /// Create a mark. The store assigns the id and creation time.
    fn add_mark(&self, data: MarkData) -> BoxFuture<'_, StoreResult<MarkId>>;

    /// Apply a partial update to an existing mark.
    fn update_mark(&self, id: MarkId, patch: MarkPatch) -> BoxFuture<'_, StoreResult<()>>;

    /// Delete a mark.
    fn delete_mark(&self, id: MarkId) -> BoxFuture<'_, StoreResult<()>>;

    /// Register a listener for the authoritative mark list.
    fn subscribe(&self, listener: MarksListener) -> Subscription;
}

type SharedListener = Arc<dyn Fn(&[Mark]) + Send + Sync>;

/// Listener bookkeeping shared by the store implementations.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, SharedListener)>>,
}

impl ListenerRegistry {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn add(self: &Arc<Self>, listener: MarksListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push((id, Arc::from(listener))),
            Err(e) => log::warn!("Listener registry poisoned, subscription dropped: {}", e),
        }
        Subscription {
            registry: Arc::downgrade(self),
            id,
        }
    }

    fn remove(&self, id: u64) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.retain(|(lid, _)| *lid != id);
        }
    }

    /// Call every listener with `marks`. The registry lock is released first
    /// so a listener may unsubscribe from inside its callback.
    pub(crate) fn notify(&self, marks: &[Mark]) {
        let listeners: Vec<SharedListener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(e) => {
                log::warn!("Listener registry poisoned: {}", e);
                return;
            }
        };
        for listener in listeners {
            listener(marks);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

/// Handle to a registered listener. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    id: u64,
}

impl Subscription {
    /// Stop receiving updates.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Mailbox holding the latest list delivered by a subscription.
///
/// Store listeners may fire from any thread and at any time, while the
/// session is driven from the UI loop. The listener from
/// [`MarksInbox::listener`] only parks the list; the loop drains it with
/// [`MarksInbox::take`] and hands it to the session. Older undrained lists are
/// superseded.
#[derive(Clone, Default)]
pub struct MarksInbox {
    latest: Arc<Mutex<Option<Vec<Mark>>>>,
}

impl MarksInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that writes into this inbox.
    pub fn listener(&self) -> MarksListener {
        let latest = Arc::clone(&self.latest);
        Box::new(move |marks| match latest.lock() {
            Ok(mut slot) => *slot = Some(marks.to_vec()),
            Err(e) => log::warn!("Marks inbox poisoned: {}", e),
        })
    }

    /// Take the latest undrained list, if any.
    pub fn take(&self) -> Option<Vec<Mark>> {
        self.latest.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Milliseconds since the Unix epoch, for `created_at`.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let sub = registry.add(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        registry.notify(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);

        sub.unsubscribe();
        registry.notify(&[]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_subscription_outlives_registry() {
        let registry = ListenerRegistry::new();
        let sub = registry.add(Box::new(|_| {}));
        drop(registry);
        drop(sub);
    }

    #[test]
    fn test_inbox_keeps_latest() {
        let inbox = MarksInbox::new();
        let listener = inbox.listener();
        assert!(inbox.take().is_none());

        let mark = Mark::new(
            uuid::Uuid::new_v4(),
            0,
            MarkData::Line(crate::marks::LineMark::new(0.1, 0.1, 0.4, 0.1, "#000")),
        );
        listener(&[]);
        listener(std::slice::from_ref(&mark));
        assert_eq!(inbox.take(), Some(vec![mark]));
        assert!(inbox.take().is_none());
    }

    #[test]
    fn test_error_messages() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            StoreError::NotFound(id).to_string(),
            format!("Mark not found: {}", id)
        );
        let err: StoreError = PatchError::TypeMismatch {
            mark: crate::marks::MarkKind::Line,
            patch: crate::marks::MarkKind::Score,
        }
        .into();
        assert!(matches!(err, StoreError::TypeMismatch(_)));
    }
}
