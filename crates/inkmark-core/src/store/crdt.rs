//! Mark store backed by a Loro CRDT document.
//!
//! # Schema
//!
//! ```text
//! LoroDoc
//! ├── "marks": LoroMap<MarkId, LoroMap> (mark data)
//! └── "order": LoroList<String> (mark ids in display order)
//! ```
//!
//! Each mark map holds `"type"` (`"line"` or `"score"`), `"createdAt"`,
//! `"color"`, `"pageNumber"` and the type-specific fields.

use super::{
    BoxFuture, ListenerRegistry, MarkStore, MarksListener, StoreError, StoreResult, Subscription,
    now_millis,
};
use crate::marks::{LineMark, Mark, MarkData, MarkId, MarkPatch, ScoreMark};
use loro::{
    ExportMode, LoroDoc, LoroList, LoroMap, LoroMapValue, LoroResult, LoroValue, ValueOrContainer,
    VersionVector,
};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Key for the marks map in the document.
pub const MARKS_KEY: &str = "marks";
/// Key for the display-order list in the document.
pub const ORDER_KEY: &str = "order";

const TYPE_LINE: &str = "line";
const TYPE_SCORE: &str = "score";

const KEY_TYPE: &str = "type";
const KEY_CREATED_AT: &str = "createdAt";
const KEY_COLOR: &str = "color";
const KEY_PAGE: &str = "pageNumber";
const KEY_X1: &str = "x1";
const KEY_Y1: &str = "y1";
const KEY_X2: &str = "x2";
const KEY_Y2: &str = "y2";
const KEY_X: &str = "x";
const KEY_Y: &str = "y";
const KEY_VALUE: &str = "value";
const KEY_FONT_SIZE: &str = "fontSize";

fn get_double(map: &LoroMapValue, key: &str) -> Option<f64> {
    match map.get(key)? {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

fn get_i64(map: &LoroMapValue, key: &str) -> Option<i64> {
    match map.get(key)? {
        LoroValue::I64(i) => Some(*i),
        LoroValue::Double(d) => Some(*d as i64),
        _ => None,
    }
}

fn get_string(map: &LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

fn mark_to_loro(created_at: u64, data: &MarkData, map: &LoroMap) -> LoroResult<()> {
    map.insert(KEY_CREATED_AT, created_at as i64)?;
    match data {
        MarkData::Line(line) => {
            map.insert(KEY_TYPE, TYPE_LINE)?;
            map.insert(KEY_X1, line.x1)?;
            map.insert(KEY_Y1, line.y1)?;
            map.insert(KEY_X2, line.x2)?;
            map.insert(KEY_Y2, line.y2)?;
            map.insert(KEY_COLOR, line.color.as_str())?;
            map.insert(KEY_PAGE, line.page_number as i64)?;
        }
        MarkData::Score(score) => {
            map.insert(KEY_TYPE, TYPE_SCORE)?;
            map.insert(KEY_X, score.x)?;
            map.insert(KEY_Y, score.y)?;
            map.insert(KEY_VALUE, score.value.as_str())?;
            map.insert(KEY_FONT_SIZE, score.font_size)?;
            map.insert(KEY_COLOR, score.color.as_str())?;
            map.insert(KEY_PAGE, score.page_number as i64)?;
        }
    }
    Ok(())
}

fn mark_from_loro(id: MarkId, map: &LoroMapValue) -> Option<Mark> {
    let created_at = get_i64(map, KEY_CREATED_AT).unwrap_or(0).max(0) as u64;
    let page_number = get_i64(map, KEY_PAGE).unwrap_or(1).max(1) as u32;
    let color = get_string(map, KEY_COLOR).unwrap_or_default();
    let data = match get_string(map, KEY_TYPE)?.as_str() {
        TYPE_LINE => MarkData::Line(LineMark {
            x1: get_double(map, KEY_X1)?,
            y1: get_double(map, KEY_Y1)?,
            x2: get_double(map, KEY_X2)?,
            y2: get_double(map, KEY_Y2)?,
            color,
            page_number,
        }),
        TYPE_SCORE => MarkData::Score(ScoreMark {
            x: get_double(map, KEY_X)?,
            y: get_double(map, KEY_Y)?,
            value: get_string(map, KEY_VALUE)?,
            font_size: get_double(map, KEY_FONT_SIZE).unwrap_or(ScoreMark::DEFAULT_FONT_SIZE),
            color,
            page_number,
        }),
        other => {
            log::warn!("Skipping mark {} with unknown type {:?}", id, other);
            return None;
        }
    };
    Some(Mark::new(id, created_at, data))
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// A Loro-backed store that can exchange updates with other replicas.
///
/// Local writes commit immediately. Remote bytes go through
/// [`CrdtMarkStore::import`], which notifies listeners like a local write.
pub struct CrdtMarkStore {
    doc: Mutex<LoroDoc>,
    listeners: Arc<ListenerRegistry>,
}

impl Default for CrdtMarkStore {
    fn default() -> Self {
        Self::from_doc(LoroDoc::new())
    }
}

impl CrdtMarkStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a snapshot exported by another replica.
    pub fn from_snapshot(bytes: &[u8]) -> StoreResult<Self> {
        let doc = LoroDoc::new();
        doc.import(bytes).map_err(backend)?;
        Ok(Self::from_doc(doc))
    }

    fn from_doc(doc: LoroDoc) -> Self {
        Self {
            doc: Mutex::new(doc),
            listeners: ListenerRegistry::new(),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, LoroDoc>> {
        self.doc.lock().map_err(|e| StoreError::Lock(e.to_string()))
    }

    /// All marks in display order.
    pub fn marks(&self) -> StoreResult<Vec<Mark>> {
        let doc = self.lock()?;
        Ok(read_marks(&doc))
    }

    /// Export the document as a snapshot (full state).
    pub fn export_snapshot(&self) -> StoreResult<Vec<u8>> {
        let doc = self.lock()?;
        doc.export(ExportMode::Snapshot).map_err(backend)
    }

    /// Export incremental updates since a version.
    pub fn export_updates(&self, since: &VersionVector) -> StoreResult<Vec<u8>> {
        let doc = self.lock()?;
        doc.export(ExportMode::updates(since)).map_err(backend)
    }

    /// Get the current version vector.
    pub fn version(&self) -> StoreResult<VersionVector> {
        Ok(self.lock()?.oplog_vv())
    }

    /// Import updates from another replica and notify listeners.
    pub fn import(&self, bytes: &[u8]) -> StoreResult<()> {
        let snapshot = {
            let doc = self.lock()?;
            doc.import(bytes).map_err(backend)?;
            read_marks(&doc)
        };
        log::debug!("Imported {} bytes, {} marks", bytes.len(), snapshot.len());
        self.listeners.notify(&snapshot);
        Ok(())
    }

    fn write<T>(&self, f: impl FnOnce(&LoroDoc) -> StoreResult<T>) -> StoreResult<T> {
        let (result, snapshot) = {
            let doc = self.lock()?;
            let result = f(&doc)?;
            doc.commit();
            (result, read_marks(&doc))
        };
        self.listeners.notify(&snapshot);
        Ok(result)
    }
}

fn marks_map(doc: &LoroDoc) -> LoroMap {
    doc.get_map(MARKS_KEY)
}

fn order_list(doc: &LoroDoc) -> LoroList {
    doc.get_list(ORDER_KEY)
}

fn order_ids(list: &LoroList) -> Vec<String> {
    let mut result = Vec::with_capacity(list.len());
    for i in 0..list.len() {
        if let Some(ValueOrContainer::Value(LoroValue::String(id))) = list.get(i) {
            result.push(id.to_string());
        }
    }
    result
}

fn read_mark(doc: &LoroDoc, id: MarkId) -> Option<Mark> {
    let LoroValue::Map(all) = marks_map(doc).get_deep_value() else {
        return None;
    };
    match all.get(&id.to_string())? {
        LoroValue::Map(map) => mark_from_loro(id, map),
        _ => None,
    }
}

fn read_marks(doc: &LoroDoc) -> Vec<Mark> {
    let LoroValue::Map(all) = marks_map(doc).get_deep_value() else {
        return Vec::new();
    };
    let mut marks = Vec::with_capacity(all.len());
    let mut seen = Vec::with_capacity(all.len());
    for key in order_ids(&order_list(doc)) {
        if seen.contains(&key) {
            continue;
        }
        let Ok(id) = Uuid::parse_str(&key) else {
            continue;
        };
        if let Some(LoroValue::Map(map)) = all.get(&key) {
            if let Some(mark) = mark_from_loro(id, map) {
                marks.push(mark);
            }
        }
        seen.push(key);
    }
    marks
}

fn remove_from_order(list: &LoroList, id: &str) -> LoroResult<()> {
    for i in (0..list.len()).rev() {
        if let Some(ValueOrContainer::Value(LoroValue::String(s))) = list.get(i) {
            if s.as_ref() == id {
                list.delete(i, 1)?;
            }
        }
    }
    Ok(())
}

impl MarkStore for CrdtMarkStore {
    fn add_mark(&self, data: MarkData) -> BoxFuture<'_, StoreResult<MarkId>> {
        Box::pin(async move {
            if !data.is_in_range() {
                return Err(StoreError::OutOfRange);
            }
            self.write(|doc| {
                let id = Uuid::new_v4();
                let key = id.to_string();
                let map = marks_map(doc)
                    .insert_container(&key, LoroMap::new())
                    .map_err(backend)?;
                mark_to_loro(now_millis(), &data, &map).map_err(backend)?;
                order_list(doc)
                    .push(key.as_str())
                    .map_err(backend)?;
                Ok(id)
            })
        })
    }

    fn update_mark(&self, id: MarkId, patch: MarkPatch) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            if !patch.is_in_range() {
                return Err(StoreError::OutOfRange);
            }
            self.write(|doc| {
                let mut mark = read_mark(doc, id).ok_or(StoreError::NotFound(id))?;
                mark.data.apply_patch(&patch)?;
                let key = id.to_string();
                let marks = marks_map(doc);
                marks.delete(&key).map_err(backend)?;
                let map = marks
                    .insert_container(&key, LoroMap::new())
                    .map_err(backend)?;
                mark_to_loro(mark.created_at, &mark.data, &map).map_err(backend)?;
                Ok(())
            })
        })
    }

    fn delete_mark(&self, id: MarkId) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.write(|doc| {
                let key = id.to_string();
                let marks = marks_map(doc);
                if marks.get(&key).is_none() {
                    return Err(StoreError::NotFound(id));
                }
                marks.delete(&key).map_err(backend)?;
                remove_from_order(&order_list(doc), &key).map_err(backend)?;
                Ok(())
            })
        })
    }

    fn subscribe(&self, listener: MarksListener) -> Subscription {
        match self.marks() {
            Ok(marks) => listener(&marks),
            Err(e) => log::warn!("Initial mark delivery failed: {}", e),
        }
        self.listeners.add(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::{LinePatch, ScorePatch};
    use pollster::block_on;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn line() -> MarkData {
        MarkData::Line(LineMark::new(0.1, 0.2, 0.5, 0.2, "#e53935"))
    }

    fn score() -> MarkData {
        MarkData::Score(ScoreMark::new(0.3, 0.4, "8", 24.0, "#e53935"))
    }

    #[test]
    fn test_add_and_read_back() {
        let store = CrdtMarkStore::new();
        let a = block_on(store.add_mark(line())).unwrap();
        let b = block_on(store.add_mark(score())).unwrap();

        let marks = store.marks().unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].id, a);
        assert_eq!(marks[0].data, line());
        assert_eq!(marks[1].id, b);
        assert_eq!(marks[1].data, score());
    }

    #[test]
    fn test_update_keeps_order_and_created_at() {
        let store = CrdtMarkStore::new();
        let a = block_on(store.add_mark(line())).unwrap();
        block_on(store.add_mark(score())).unwrap();
        let created = store.marks().unwrap()[0].created_at;

        let patch = MarkPatch::Line(LinePatch {
            y1: Some(0.3),
            y2: Some(0.3),
            ..LinePatch::default()
        });
        block_on(store.update_mark(a, patch)).unwrap();

        let marks = store.marks().unwrap();
        assert_eq!(marks[0].id, a);
        assert_eq!(marks[0].created_at, created);
        let updated = marks[0].data.as_line().unwrap();
        assert_eq!(updated.y1, 0.3);
        assert_eq!(updated.x2, 0.5);
    }

    #[test]
    fn test_update_errors() {
        let store = CrdtMarkStore::new();
        let a = block_on(store.add_mark(line())).unwrap();
        let patch = MarkPatch::Score(ScorePatch {
            value: Some("1".into()),
            ..ScorePatch::default()
        });
        assert!(matches!(
            block_on(store.update_mark(a, patch)),
            Err(StoreError::TypeMismatch(_))
        ));
        let missing = MarkPatch::replace(&line());
        assert!(matches!(
            block_on(store.update_mark(Uuid::new_v4(), missing)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete() {
        let store = CrdtMarkStore::new();
        let a = block_on(store.add_mark(line())).unwrap();
        block_on(store.delete_mark(a)).unwrap();
        assert!(store.marks().unwrap().is_empty());
        assert!(matches!(
            block_on(store.delete_mark(a)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_replicas_converge() {
        let local = CrdtMarkStore::new();
        let a = block_on(local.add_mark(line())).unwrap();

        let remote = CrdtMarkStore::from_snapshot(&local.export_snapshot().unwrap()).unwrap();
        assert_eq!(remote.marks().unwrap(), local.marks().unwrap());

        let notified = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notified);
        let _sub = local.subscribe(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(notified.load(Ordering::SeqCst), 1);

        let since = local.version().unwrap();
        block_on(remote.add_mark(score())).unwrap();
        block_on(remote.delete_mark(a)).unwrap();
        local
            .import(&remote.export_updates(&since).unwrap())
            .unwrap();

        assert_eq!(notified.load(Ordering::SeqCst), 2);
        let marks = local.marks().unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0].data, score());
    }
}
