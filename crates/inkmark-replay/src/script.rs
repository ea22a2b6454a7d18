//! Replay scripts.
//!
//! A script is a JSON object:
//! ```json
//! {
//!   "canvas": { "width": 1000, "height": 1000 },
//!   "config": { "snap_threshold_px": 10 },
//!   "marks": [],
//!   "steps": [
//!     { "op": "set_mode", "mode": "line" },
//!     { "op": "pointer", "kind": "mouse", "phase": "down", "position": { "x": 100, "y": 300 } },
//!     { "op": "pointer", "kind": "mouse", "phase": "up", "position": { "x": 505, "y": 300 } },
//!     { "op": "undo" }
//!   ]
//! }
//! ```

use inkmark_core::{
    EditMode, EditorConfig, Mark, MarkEdit, MarkId, MarkPatch, MarkStore, MarksInbox,
    MemoryMarkStore, PointerEvent, Session, StoreError, Subscription,
};
use kurbo::Size;
use pollster::block_on;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Replay errors.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Step {step}: no mark at index {index}")]
    NoSuchMark { step: usize, index: usize },
    #[error("Step {step}: {source}")]
    Store { step: usize, source: StoreError },
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl From<CanvasSize> for Size {
    fn from(c: CanvasSize) -> Self {
        Size::new(c.width, c.height)
    }
}

#[derive(Debug, Deserialize)]
pub struct Script {
    pub canvas: CanvasSize,
    #[serde(default)]
    pub config: EditorConfig,
    #[serde(default)]
    pub document: Option<String>,
    /// Marks present in the store before the first step.
    #[serde(default)]
    pub marks: Vec<Mark>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// One scripted action. Mark indices refer to the session's current list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    SetMode(EditMode),
    /// Raw pointer event in device pixels.
    Pointer(PointerEvent),
    Select { index: Option<usize> },
    Undo,
    Redo,
    Delete,
    Duplicate,
    Edit(MarkEdit),
    Cancel,
    /// The canvas layout changed size.
    Resize(CanvasSize),
    /// Another viewer deletes a mark.
    RemoteDelete { index: usize },
    /// Another viewer patches a mark.
    RemoteUpdate { index: usize, patch: MarkPatch },
}

/// Final state printed by the tool.
#[derive(Debug, Serialize)]
pub struct Report {
    pub marks: Vec<Mark>,
    pub selected: Option<MarkId>,
    pub can_undo: bool,
    pub can_redo: bool,
    /// Viewport matrix as `[a, b, c, d, e, f]`.
    pub viewport: [f64; 6],
}

/// A session wired to an in-memory store.
pub struct Replay {
    store: MemoryMarkStore,
    inbox: MarksInbox,
    _subscription: Subscription,
    session: Session,
}

impl Replay {
    pub fn new(script: &Script) -> Self {
        let store = MemoryMarkStore::with_marks(script.marks.clone());
        let inbox = MarksInbox::new();
        let subscription = store.subscribe(inbox.listener());
        let mut session = Session::with_config(script.config.clone(), script.canvas.into());
        let document = script.document.clone().unwrap_or_else(|| "replay".to_string());
        session.load_document(document, inbox.take().unwrap_or_default());
        Self {
            store,
            inbox,
            _subscription: subscription,
            session,
        }
    }

    fn mark_id(&self, step: usize, index: usize) -> Result<MarkId, ReplayError> {
        self.session
            .marks()
            .get(index)
            .map(|m| m.id)
            .ok_or(ReplayError::NoSuchMark { step, index })
    }

    /// Run one step. Editor errors are logged and the script continues.
    pub fn step(&mut self, number: usize, step: Step) -> Result<(), ReplayError> {
        log::debug!("Step {}: {:?}", number, step);
        match step {
            Step::SetMode(mode) => self.session.set_mode(mode),
            Step::Pointer(event) => {
                for op in self.session.handle_pointer(event) {
                    let result = block_on(self.session.commit(&self.store, op));
                    log_outcome(number, result);
                }
            }
            Step::Select { index } => {
                let id = index.map(|i| self.mark_id(number, i)).transpose()?;
                self.session.select(id);
            }
            Step::Undo => log_outcome(number, block_on(self.session.undo(&self.store))),
            Step::Redo => log_outcome(number, block_on(self.session.redo(&self.store))),
            Step::Delete => {
                log_outcome(number, block_on(self.session.delete_selected(&self.store)))
            }
            Step::Duplicate => {
                log_outcome(number, block_on(self.session.duplicate_selected(&self.store)))
            }
            Step::Edit(edit) => {
                log_outcome(number, block_on(self.session.edit_selected(&self.store, edit)))
            }
            Step::Cancel => self.session.cancel(),
            Step::Resize(canvas) => self.session.set_canvas(canvas.into()),
            Step::RemoteDelete { index } => {
                let id = self.mark_id(number, index)?;
                self.store
                    .apply_remote(|marks| marks.retain(|m| m.id != id))
                    .map_err(|source| ReplayError::Store { step: number, source })?;
            }
            Step::RemoteUpdate { index, patch } => {
                let id = self.mark_id(number, index)?;
                self.store
                    .apply_remote(|marks| {
                        if let Some(mark) = marks.iter_mut().find(|m| m.id == id) {
                            if let Err(e) = mark.data.apply_patch(&patch) {
                                log::warn!("Remote patch rejected: {}", e);
                            }
                        }
                    })
                    .map_err(|source| ReplayError::Store { step: number, source })?;
            }
        }
        self.session.poll_inbox(&self.inbox);
        Ok(())
    }

    pub fn report(&self) -> Report {
        Report {
            marks: self.session.marks().to_vec(),
            selected: self.session.selected(),
            can_undo: self.session.can_undo(),
            can_redo: self.session.can_redo(),
            viewport: self.session.viewport().coeffs(),
        }
    }
}

fn log_outcome<T: std::fmt::Debug>(step: usize, result: inkmark_core::EditorResult<T>) {
    match result {
        Ok(value) => log::debug!("Step {} -> {:?}", step, value),
        Err(e) => log::warn!("Step {} failed: {}", step, e),
    }
}

/// Run a whole script and return the final state.
pub fn run(script: Script) -> Result<Report, ReplayError> {
    let mut replay = Replay::new(&script);
    for (number, step) in script.steps.into_iter().enumerate() {
        replay.step(number, step)?;
    }
    Ok(replay.report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkmark_core::{MarkData, PointerKind, PointerPhase};

    const DRAW_LINE: &str = r##"{
        "canvas": { "width": 1000, "height": 1000 },
        "marks": [
            { "id": "6f1c3a52-8d0e-4a7b-9c2d-1e5f7a9b3c4d", "type": "line",
              "x1": 0.5, "y1": 0.4, "x2": 0.5, "y2": 0.9, "color": "#000" }
        ],
        "steps": [
            { "op": "set_mode", "mode": "line" },
            { "op": "pointer", "kind": "mouse", "phase": "down", "position": { "x": 100, "y": 300 } },
            { "op": "pointer", "kind": "mouse", "phase": "move", "position": { "x": 505, "y": 300 } },
            { "op": "pointer", "kind": "mouse", "phase": "up", "position": { "x": 505, "y": 300 } }
        ]
    }"##;

    #[test]
    fn test_parse_steps() {
        let script = Script::from_json(DRAW_LINE).unwrap();
        assert_eq!(script.steps.len(), 4);
        assert_eq!(script.steps[0], Step::SetMode(EditMode::Line));
        let Step::Pointer(event) = &script.steps[1] else {
            panic!("expected a pointer step");
        };
        assert_eq!(event.kind, PointerKind::Mouse);
        assert_eq!(event.phase, PointerPhase::Down);
        assert_eq!(script.config, EditorConfig::default());

        let edit: Step = serde_json::from_str(r#"{ "op": "edit", "edit": "label", "value": "7" }"#).unwrap();
        assert_eq!(edit, Step::Edit(MarkEdit::Label("7".into())));
        let score: Step =
            serde_json::from_str(r#"{ "op": "set_mode", "mode": "score", "label": "5" }"#).unwrap();
        assert_eq!(score, Step::SetMode(EditMode::score("5")));
    }

    #[test]
    fn test_run_draws_snapped_line() {
        let report = run(Script::from_json(DRAW_LINE).unwrap()).unwrap();
        assert_eq!(report.marks.len(), 2);
        let MarkData::Line(line) = &report.marks[1].data else {
            panic!("expected a line");
        };
        assert!((line.x2 - 0.50).abs() < 1e-9);
        assert!((line.x1 - 0.095).abs() < 1e-9);
        assert!(report.can_undo);
        assert_eq!(report.selected, Some(report.marks[1].id));
        assert_eq!(report.viewport, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_remote_delete_and_undo() {
        let mut script = Script::from_json(DRAW_LINE).unwrap();
        script.steps.push(Step::RemoteDelete { index: 1 });
        script.steps.push(Step::Undo);
        let report = run(script).unwrap();
        assert_eq!(report.marks.len(), 1);
        assert!(!report.can_undo);
        assert!(report.can_redo);
    }

    #[test]
    fn test_bad_index_fails() {
        let mut script = Script::from_json(DRAW_LINE).unwrap();
        script.steps.push(Step::RemoteDelete { index: 9 });
        assert!(matches!(
            run(script),
            Err(ReplayError::NoSuchMark { step: 4, index: 9 })
        ));
    }

    #[test]
    fn test_resize_changes_pointer_mapping() {
        let mut script = Script::from_json(DRAW_LINE).unwrap();
        let resize: Step =
            serde_json::from_str(r#"{ "op": "resize", "width": 2000, "height": 2000 }"#).unwrap();
        assert_eq!(resize, Step::Resize(CanvasSize { width: 2000.0, height: 2000.0 }));
        script.steps.insert(1, resize);

        // The same device pixels now land at half the normalized distance.
        let report = run(script).unwrap();
        assert_eq!(report.marks.len(), 2);
        let MarkData::Line(line) = &report.marks[1].data else {
            panic!("expected a line");
        };
        assert!((line.x1 - 0.05).abs() < 1e-9);
        assert!((line.x2 - 0.2525).abs() < 1e-9);
        assert!((line.y1 - 0.15).abs() < 1e-9);
    }
}
