//! Editing session.
//!
//! A [`Session`] owns everything with a document lifetime: the editor state
//! driven by the gesture reducer, the undo history, the viewport and the input
//! router. It never owns the marks themselves. Finalized edits go to a
//! [`MarkStore`], and the store's list comes back through
//! [`Session::sync_marks`].

use crate::config::EditorConfig;
use crate::history::{History, HistoryEntry};
use crate::input::{GestureEvent, InputRouter, PinchEvent, PointerEvent, RoutedEvent};
use crate::interaction::{EditorState, MarkOp, ReduceEnv, Reduced, reduce};
use crate::marks::{LineMark, Mark, MarkData, MarkId, MarkPatch, find_mark};
use crate::selection::{to_normalized, translate_mark};
use crate::snap::SnapGuides;
use crate::store::{MarkStore, MarksInbox, StoreError, StoreResult, now_millis};
use crate::tools::EditMode;
use crate::viewport::Viewport;
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session errors.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("No mark selected")]
    NothingSelected,
}

/// Result type for session operations.
pub type EditorResult<T> = Result<T, EditorError>;

/// Property edit applied to the selected mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "edit", content = "value", rename_all = "snake_case")]
pub enum MarkEdit {
    Color(String),
    /// Score marks only.
    Label(String),
    /// Score marks only.
    FontSize(f64),
}

/// A store write that went through, mirrored into the local lists.
#[derive(Debug, Clone, PartialEq)]
enum Change {
    Added(MarkId, MarkData),
    Deleted(MarkId),
    Updated(MarkId, MarkData),
}

/// Current data of a mark, preferring the store's list over the overlay.
fn current_data(authoritative: &[Mark], scratch: &[Mark], id: MarkId) -> Option<MarkData> {
    find_mark(authoritative, id)
        .or_else(|| find_mark(scratch, id))
        .map(|m| m.data.clone())
}

async fn remove(store: &dyn MarkStore, id: MarkId) -> StoreResult<Option<Change>> {
    match store.delete_mark(id).await {
        Ok(()) => Ok(Some(Change::Deleted(id))),
        Err(StoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

async fn recreate(store: &dyn MarkStore, data: &MarkData) -> StoreResult<Option<Change>> {
    let id = store.add_mark(data.clone()).await?;
    Ok(Some(Change::Added(id, data.clone())))
}

async fn overwrite(
    store: &dyn MarkStore,
    id: MarkId,
    current: &MarkData,
    target: &MarkData,
) -> StoreResult<Option<Change>> {
    if let Some(patch) = MarkPatch::diff(current, target) {
        match store.update_mark(id, patch).await {
            Ok(()) => {}
            Err(StoreError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        }
    }
    Ok(Some(Change::Updated(id, target.clone())))
}

/// Revert one history entry against the store.
///
/// `Ok(None)` means the mark vanished remotely and the step was skipped.
async fn revert(
    entry: &mut HistoryEntry,
    authoritative: &[Mark],
    scratch: &[Mark],
    store: &dyn MarkStore,
) -> StoreResult<Option<Change>> {
    match entry {
        HistoryEntry::Add { id, mark } => {
            let Some(current) = current_data(authoritative, scratch, *id) else {
                return Ok(None);
            };
            *mark = current;
            remove(store, *id).await
        }
        HistoryEntry::Delete { mark, .. } => recreate(store, mark).await,
        HistoryEntry::Update { id, before, after } => {
            let Some(current) = current_data(authoritative, scratch, *id) else {
                return Ok(None);
            };
            *after = current;
            overwrite(store, *id, after, before).await
        }
    }
}

/// Re-apply one history entry against the store.
async fn reapply(
    entry: &mut HistoryEntry,
    authoritative: &[Mark],
    scratch: &[Mark],
    store: &dyn MarkStore,
) -> StoreResult<Option<Change>> {
    match entry {
        HistoryEntry::Add { mark, .. } => recreate(store, mark).await,
        HistoryEntry::Delete { id, mark } => {
            let Some(current) = current_data(authoritative, scratch, *id) else {
                return Ok(None);
            };
            *mark = current;
            remove(store, *id).await
        }
        HistoryEntry::Update { id, after, .. } => {
            let Some(current) = current_data(authoritative, scratch, *id) else {
                return Ok(None);
            };
            overwrite(store, *id, &current, after).await
        }
    }
}

/// Interactive editing session for one document at a time.
#[derive(Debug)]
pub struct Session {
    document_id: Option<String>,
    config: EditorConfig,
    /// Canvas layout size in pixels.
    canvas: Size,
    state: EditorState,
    /// Last list received from the store, plus confirmed local writes.
    authoritative: Vec<Mark>,
    history: History,
    viewport: Viewport,
    router: InputRouter,
    /// A sync arrived mid-gesture and is applied when the gesture ends.
    pending_resync: bool,
}

impl Session {
    pub fn new(canvas: Size) -> Self {
        Self::with_config(EditorConfig::default(), canvas)
    }

    pub fn with_config(config: EditorConfig, canvas: Size) -> Self {
        Self {
            document_id: None,
            viewport: Viewport::with_epsilon(config.pinch_epsilon),
            router: InputRouter::new(config.touch_slop_px),
            config,
            canvas,
            state: EditorState::default(),
            authoritative: Vec::new(),
            history: History::new(),
            pending_resync: false,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    /// Update the canvas layout size, e.g. after a resize.
    pub fn set_canvas(&mut self, canvas: Size) {
        log::debug!("Canvas resized to {}x{}", canvas.width, canvas.height);
        self.canvas = canvas;
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Switch to a document. History, selection, gesture and viewport are
    /// reset when the id differs from the current one.
    pub fn load_document(&mut self, id: impl Into<String>, marks: Vec<Mark>) {
        let id = id.into();
        if self.document_id.as_deref() != Some(id.as_str()) {
            log::info!("Loading document {} ({} marks)", id, marks.len());
            self.history.clear();
            self.state = EditorState {
                mode: std::mem::take(&mut self.state.mode),
                ..EditorState::default()
            };
            self.viewport.reset();
            self.router.reset();
            self.pending_resync = false;
            self.document_id = Some(id);
        }
        self.sync_marks(marks);
    }

    /// Replace the authoritative list with the store's latest.
    ///
    /// While a gesture is running its overlay is left alone and reconciled
    /// when the gesture ends.
    pub fn sync_marks(&mut self, marks: Vec<Mark>) {
        self.authoritative = marks;
        if self.state.gesture.is_idle() {
            self.state.scratch = self.authoritative.clone();
            self.drop_vanished_selection();
            self.pending_resync = false;
        } else {
            log::debug!("Deferring mark sync until the gesture ends");
            self.pending_resync = true;
        }
    }

    /// Drain `inbox` into the session. Returns whether anything arrived.
    pub fn poll_inbox(&mut self, inbox: &MarksInbox) -> bool {
        match inbox.take() {
            Some(marks) => {
                self.sync_marks(marks);
                true
            }
            None => false,
        }
    }

    /// Marks to render: the authoritative list with the gesture overlay.
    pub fn marks(&self) -> &[Mark] {
        &self.state.scratch
    }

    pub fn authoritative(&self) -> &[Mark] {
        &self.authoritative
    }

    /// The line being drawn, if any.
    pub fn preview(&self) -> Option<&LineMark> {
        self.state.preview.as_ref()
    }

    pub fn selected(&self) -> Option<MarkId> {
        self.state.selected
    }

    /// Select a mark by id, or clear the selection with `None`.
    ///
    /// Returns false when the id is unknown.
    pub fn select(&mut self, id: Option<MarkId>) -> bool {
        match id {
            Some(id) if find_mark(&self.state.scratch, id).is_none() => {
                log::debug!("Cannot select unknown mark {}", id);
                false
            }
            _ => {
                self.state.selected = id;
                true
            }
        }
    }

    pub fn guides(&self) -> SnapGuides {
        self.state.guides
    }

    pub fn mode(&self) -> &EditMode {
        &self.state.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        log::debug!("Edit mode {:?}", mode);
        self.state.mode = mode;
    }

    pub fn is_idle(&self) -> bool {
        self.state.gesture.is_idle()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Feed a raw pointer event in device pixels.
    ///
    /// Returns the finalized edits the caller should pass to
    /// [`Session::commit`].
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Vec<MarkOp> {
        let mut ops = Vec::new();
        for routed in self.router.route(event) {
            match routed {
                RoutedEvent::Gesture(gesture) => {
                    let gesture = self.normalize(gesture);
                    ops.extend(self.handle_gesture(gesture));
                }
                RoutedEvent::Pinch(pinch) => self.handle_pinch(pinch),
            }
        }
        ops
    }

    fn normalize(&self, event: GestureEvent) -> GestureEvent {
        let map = |p: Point| to_normalized(self.viewport.device_to_canvas(p), self.canvas);
        match event {
            GestureEvent::Down(p) => GestureEvent::Down(map(p)),
            GestureEvent::Move(p) => GestureEvent::Move(map(p)),
            GestureEvent::Up(p) => GestureEvent::Up(map(p)),
            GestureEvent::Cancel => GestureEvent::Cancel,
        }
    }

    fn handle_pinch(&mut self, event: PinchEvent) {
        match event {
            PinchEvent::Begin(a, b) => {
                if !self.viewport.begin_pinch(a, b) {
                    log::debug!("Ignoring pinch with coincident fingers");
                }
            }
            PinchEvent::Update(a, b) => {
                self.viewport.update_pinch(a, b);
            }
            PinchEvent::End => self.viewport.end_pinch(),
        }
    }

    /// Feed a gesture event already in normalized canvas coordinates.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> Option<MarkOp> {
        let env = ReduceEnv {
            authoritative: &self.authoritative,
            canvas: self.canvas,
            config: &self.config,
        };
        let Reduced { state, op } = reduce(std::mem::take(&mut self.state), event, &env);
        self.state = state;

        if self.pending_resync && self.state.gesture.is_idle() {
            self.resync_after_gesture(op.as_ref());
        }
        op
    }

    /// Abort the current gesture and pinch. Nothing is persisted.
    pub fn cancel(&mut self) {
        self.router.reset();
        self.viewport.end_pinch();
        self.handle_gesture(GestureEvent::Cancel);
    }

    /// Apply a sync deferred during the gesture, keeping the result of a drag
    /// that is about to be committed.
    fn resync_after_gesture(&mut self, op: Option<&MarkOp>) {
        let mut scratch = self.authoritative.clone();
        if let Some(MarkOp::Update { id, after, .. }) = op {
            if let Some(mark) = scratch.iter_mut().find(|m| m.id == *id) {
                mark.data = after.clone();
            }
        }
        self.state.scratch = scratch;
        self.drop_vanished_selection();
        self.pending_resync = false;
    }

    fn drop_vanished_selection(&mut self) {
        if let Some(id) = self.state.selected {
            if find_mark(&self.state.scratch, id).is_none() {
                log::debug!("Selected mark {} is gone", id);
                self.state.selected = None;
            }
        }
    }

    fn apply_change(&mut self, change: Change) {
        match change {
            Change::Added(id, data) => {
                for list in [&mut self.authoritative, &mut self.state.scratch] {
                    if find_mark(list, id).is_none() {
                        list.push(Mark::new(id, now_millis(), data.clone()));
                    }
                }
            }
            Change::Deleted(id) => {
                self.authoritative.retain(|m| m.id != id);
                self.state.scratch.retain(|m| m.id != id);
                if self.state.selected == Some(id) {
                    self.state.selected = None;
                }
            }
            Change::Updated(id, data) => {
                for list in [&mut self.authoritative, &mut self.state.scratch] {
                    if let Some(mark) = list.iter_mut().find(|m| m.id == id) {
                        mark.data = data.clone();
                    }
                }
            }
        }
    }

    /// Persist a finalized edit and record it in the history.
    ///
    /// Returns the id of the affected mark, or `None` when the edit targeted a
    /// mark that no longer exists.
    pub async fn commit(
        &mut self,
        store: &dyn MarkStore,
        op: MarkOp,
    ) -> EditorResult<Option<MarkId>> {
        match op {
            MarkOp::Add(data) => {
                let data = data.clamped();
                let kind = data.kind();
                let id = match store.add_mark(data.clone()).await {
                    Ok(id) => id,
                    Err(e) => {
                        log::warn!("Failed to add {} mark: {}", kind, e);
                        return Err(e.into());
                    }
                };
                log::info!("Added {} mark {}", kind, id);
                self.history.push(HistoryEntry::Add {
                    id,
                    mark: data.clone(),
                });
                self.apply_change(Change::Added(id, data));
                self.state.selected = Some(id);
                Ok(Some(id))
            }
            MarkOp::Update { id, before, after } => {
                if find_mark(&self.authoritative, id).is_none() {
                    log::debug!("Dropping update to vanished mark {}", id);
                    self.forget(id);
                    return Ok(None);
                }
                let Some(patch) = MarkPatch::diff(&before, &after) else {
                    return Ok(None);
                };
                match store.update_mark(id, patch).await {
                    Ok(()) => {}
                    Err(StoreError::NotFound(_)) => {
                        log::debug!("Mark {} deleted before the update landed", id);
                        self.forget(id);
                        return Ok(None);
                    }
                    Err(e) => {
                        log::warn!("Failed to update mark {}: {}", id, e);
                        return Err(e.into());
                    }
                }
                log::info!("Updated {} mark {}", after.kind(), id);
                self.history.push(HistoryEntry::Update {
                    id,
                    before,
                    after: after.clone(),
                });
                self.apply_change(Change::Updated(id, after));
                Ok(Some(id))
            }
        }
    }

    /// Drop a mark that vanished remotely from the local lists.
    fn forget(&mut self, id: MarkId) {
        self.apply_change(Change::Deleted(id));
    }

    /// Revert the last applied history entry.
    ///
    /// Returns whether the store changed. A step whose mark vanished remotely
    /// is consumed without a write. Ignored while a gesture is running.
    pub async fn undo(&mut self, store: &dyn MarkStore) -> EditorResult<bool> {
        if !self.state.gesture.is_idle() {
            log::debug!("Undo ignored during a gesture");
            return Ok(false);
        }
        let Some(entry) = self.history.undo() else {
            return Ok(false);
        };
        let old_id = entry.id();
        let label = entry.label();
        let kind = entry.mark_kind();
        match revert(entry, &self.authoritative, &self.state.scratch, store).await {
            Ok(change) => {
                log::info!("Undid {} of {} mark {}", label, kind, old_id);
                Ok(self.finish_replay(old_id, change))
            }
            Err(e) => {
                log::warn!("Undo of {} failed: {}", label, e);
                self.history.rollback_undo();
                Err(e.into())
            }
        }
    }

    /// Re-apply the next history entry. See [`Session::undo`].
    pub async fn redo(&mut self, store: &dyn MarkStore) -> EditorResult<bool> {
        if !self.state.gesture.is_idle() {
            log::debug!("Redo ignored during a gesture");
            return Ok(false);
        }
        let Some(entry) = self.history.redo() else {
            return Ok(false);
        };
        let old_id = entry.id();
        let label = entry.label();
        let kind = entry.mark_kind();
        match reapply(entry, &self.authoritative, &self.state.scratch, store).await {
            Ok(change) => {
                log::info!("Redid {} of {} mark {}", label, kind, old_id);
                Ok(self.finish_replay(old_id, change))
            }
            Err(e) => {
                log::warn!("Redo of {} failed: {}", label, e);
                self.history.rollback_redo();
                Err(e.into())
            }
        }
    }

    fn finish_replay(&mut self, old_id: MarkId, change: Option<Change>) -> bool {
        let Some(change) = change else {
            log::debug!("Mark {} no longer exists, history step skipped", old_id);
            self.forget(old_id);
            return false;
        };
        if let Change::Added(new_id, _) = &change {
            self.history.remap_id(old_id, *new_id);
            if self.state.selected == Some(old_id) {
                self.state.selected = Some(*new_id);
            }
        }
        self.apply_change(change);
        true
    }

    fn require_idle(&self) -> EditorResult<()> {
        if self.state.gesture.is_idle() {
            Ok(())
        } else {
            Err(EditorError::InvalidInput("a gesture is in progress"))
        }
    }

    /// The selected mark's id and current data. `Ok(None)` when it vanished.
    fn selected_data(&mut self) -> EditorResult<Option<(MarkId, MarkData)>> {
        self.require_idle()?;
        let id = self.state.selected.ok_or(EditorError::NothingSelected)?;
        match current_data(&self.authoritative, &self.state.scratch, id) {
            Some(data) => Ok(Some((id, data))),
            None => {
                log::debug!("Selected mark {} is gone", id);
                self.state.selected = None;
                Ok(None)
            }
        }
    }

    /// Delete the selected mark. Returns false when it was already gone.
    pub async fn delete_selected(&mut self, store: &dyn MarkStore) -> EditorResult<bool> {
        let Some((id, mark)) = self.selected_data()? else {
            return Ok(false);
        };
        match remove(store, id).await {
            Ok(Some(change)) => {
                log::info!("Deleted {} mark {}", mark.kind(), id);
                self.history.push(HistoryEntry::Delete { id, mark });
                self.apply_change(change);
                Ok(true)
            }
            Ok(None) => {
                log::debug!("Mark {} already deleted", id);
                self.forget(id);
                Ok(false)
            }
            Err(e) => {
                log::warn!("Failed to delete mark {}: {}", id, e);
                Err(e.into())
            }
        }
    }

    /// Copy the selected mark, offset by the configured distance, and select
    /// the copy.
    pub async fn duplicate_selected(
        &mut self,
        store: &dyn MarkStore,
    ) -> EditorResult<Option<MarkId>> {
        let Some((_, source)) = self.selected_data()? else {
            return Ok(None);
        };
        let offset = self.config.duplicate_offset;
        let copy = translate_mark(&source, Vec2::new(offset, offset));
        self.commit(store, MarkOp::Add(copy)).await
    }

    /// Change a property of the selected mark.
    pub async fn edit_selected(
        &mut self,
        store: &dyn MarkStore,
        edit: MarkEdit,
    ) -> EditorResult<bool> {
        let Some((id, before)) = self.selected_data()? else {
            return Ok(false);
        };
        let mut after = before.clone();
        match (&mut after, edit) {
            (data, MarkEdit::Color(color)) => {
                let color = color.trim();
                if color.is_empty() {
                    return Err(EditorError::InvalidInput("color must not be empty"));
                }
                data.set_color(color);
            }
            (MarkData::Score(score), MarkEdit::Label(label)) => {
                let label = label.trim();
                if label.is_empty() {
                    return Err(EditorError::InvalidInput("label must not be empty"));
                }
                score.value = label.to_string();
            }
            (MarkData::Score(score), MarkEdit::FontSize(size)) => {
                if !(size.is_finite() && size > 0.0) {
                    return Err(EditorError::InvalidInput("font size must be positive"));
                }
                score.font_size = size;
            }
            (MarkData::Line(_), _) => {
                return Err(EditorError::InvalidInput("lines have no label or font size"));
            }
        }
        let op = MarkOp::Update { id, before, after };
        Ok(self.commit(store, op).await?.is_some())
    }
}
