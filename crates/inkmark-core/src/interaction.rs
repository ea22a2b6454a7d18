//! Gesture reducer for drawing, dragging and resizing marks.
//!
//! [`reduce`] takes the owned editor state and one pointer event in
//! normalized coordinates, and returns the next state plus at most one
//! finalized [`MarkOp`] for the session to persist. Nothing here talks to
//! the store; during a gesture only the scratch overlay changes.

use crate::config::EditorConfig;
use crate::input::GestureEvent;
use crate::marks::{Endpoint, LineMark, Mark, MarkData, MarkId, ScoreMark};
use crate::selection::{
    ManipulationState, clamp_point, hit_test_handles, hit_test_marks, move_endpoint, translate_mark,
};
use crate::snap::{
    SnapGuides, SnapThreshold, snap_drawn_line, snap_line_endpoint, snap_line_translation,
    snap_score,
};
use crate::tools::EditMode;
use kurbo::{Point, Size};

/// Active pointer gesture. At most one exists at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// A new line being dragged out from a fixed start point.
    Drawing { start: Point },
    /// An existing mark being translated.
    DraggingMark(ManipulationState),
    /// One endpoint of the selected line being moved.
    DraggingHandle {
        handle: Endpoint,
        manipulation: ManipulationState,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// A finalized edit for the session to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkOp {
    Add(MarkData),
    Update {
        id: MarkId,
        before: MarkData,
        after: MarkData,
    },
}

/// Everything the reducer owns between events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub mode: EditMode,
    pub gesture: Gesture,
    /// Gesture-local copy of the mark list, used for rendering.
    pub scratch: Vec<Mark>,
    pub selected: Option<MarkId>,
    pub guides: SnapGuides,
    /// The line being drawn, for rendering.
    pub preview: Option<LineMark>,
}

impl EditorState {
    pub fn new(marks: Vec<Mark>) -> Self {
        Self {
            scratch: marks,
            ..Self::default()
        }
    }

    fn scratch_data(&self, id: MarkId) -> Option<&MarkData> {
        self.scratch.iter().find(|m| m.id == id).map(|m| &m.data)
    }

    fn set_scratch_data(&mut self, id: MarkId, data: MarkData) {
        if let Some(mark) = self.scratch.iter_mut().find(|m| m.id == id) {
            mark.data = data;
        }
    }
}

/// Read-only context for one reducer step.
#[derive(Debug, Clone, Copy)]
pub struct ReduceEnv<'a> {
    /// Last mark list received from the store.
    pub authoritative: &'a [Mark],
    /// Canvas layout size in pixels.
    pub canvas: Size,
    pub config: &'a EditorConfig,
}

impl ReduceEnv<'_> {
    fn threshold(&self) -> SnapThreshold {
        SnapThreshold::from_canvas(self.config.snap_threshold_px, self.canvas)
    }

    fn min_length(&self) -> SnapThreshold {
        SnapThreshold::from_canvas(self.config.min_line_length_px, self.canvas)
    }
}

/// Result of one reducer step.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced {
    pub state: EditorState,
    pub op: Option<MarkOp>,
}

impl Reduced {
    fn unchanged(state: EditorState) -> Self {
        Self { state, op: None }
    }
}

/// Advance the editor state by one pointer event.
///
/// Positions are normalized canvas coordinates and may lie outside `[0, 1]`;
/// everything stored is clamped.
pub fn reduce(state: EditorState, event: GestureEvent, env: &ReduceEnv<'_>) -> Reduced {
    match event {
        GestureEvent::Down(point) => pointer_down(state, point, env),
        GestureEvent::Move(point) => Reduced::unchanged(pointer_move(state, point, env)),
        GestureEvent::Up(point) => pointer_up(state, point, env),
        GestureEvent::Cancel => Reduced::unchanged(cancel(state, env)),
    }
}

fn pointer_down(mut state: EditorState, point: Point, env: &ReduceEnv<'_>) -> Reduced {
    if !state.gesture.is_idle() {
        log::debug!("Ignoring pointer down during {:?}", state.gesture);
        return Reduced::unchanged(state);
    }

    let mode = state.mode.clone();
    match mode {
        EditMode::Line => {
            let start = clamp_point(point);
            log::debug!("Drawing line from {:?}", start);
            state.scratch = env.authoritative.to_vec();
            state.gesture = Gesture::Drawing { start };
            state.preview = None;
            state.guides = SnapGuides::none();
            Reduced::unchanged(state)
        }
        EditMode::Score { .. } => {
            let Some(label) = mode.pending_label() else {
                log::debug!("Score placement aborted: empty label");
                return Reduced::unchanged(state);
            };
            let anchor = clamp_point(point);
            let mut score = ScoreMark::new(
                anchor.x,
                anchor.y,
                label,
                env.config.font_size,
                env.config.score_color.clone(),
            );
            score.page_number = env.config.page_number;
            state.mode = EditMode::Select;
            Reduced {
                state,
                op: Some(MarkOp::Add(MarkData::Score(score))),
            }
        }
        EditMode::Select => Reduced::unchanged(begin_select(state, point, env)),
    }
}

fn begin_select(mut state: EditorState, point: Point, env: &ReduceEnv<'_>) -> EditorState {
    state.scratch = env.authoritative.to_vec();
    let config = env.config;

    let selected_line = state
        .selected
        .and_then(|id| state.scratch_data(id).and_then(MarkData::as_line).map(|l| (id, l)));
    if let Some((id, line)) = selected_line {
        if let Some(endpoint) = hit_test_handles(line, point, env.canvas, config.handle_radius_px) {
            log::debug!("Resizing {} by its {:?} handle", id, endpoint);
            let original = MarkData::Line(line.clone());
            state.gesture = Gesture::DraggingHandle {
                handle: endpoint,
                manipulation: ManipulationState::new(id, point, original),
            };
            return state;
        }
    }

    match hit_test_marks(&state.scratch, point, env.canvas, config.hit_stroke_px) {
        Some(id) => {
            if let Some(original) = state.scratch_data(id).cloned() {
                log::debug!("Dragging {} mark {}", original.kind(), id);
                state.selected = Some(id);
                state.gesture =
                    Gesture::DraggingMark(ManipulationState::new(id, point, original));
            }
        }
        None => {
            if state.selected.take().is_some() {
                log::debug!("Selection cleared");
            }
        }
    }
    state
}

/// Constrain a drawn segment to the dominant axis.
fn drawn_line(start: Point, pointer: Point, canvas: Size, config: &EditorConfig) -> LineMark {
    let end = clamp_point(pointer);
    let dx = (end.x - start.x) * canvas.width;
    let dy = (end.y - start.y) * canvas.height;
    let end = if dx.abs() >= dy.abs() {
        Point::new(end.x, start.y)
    } else {
        Point::new(start.x, end.y)
    };
    let mut line = LineMark::from_points(start, end, config.line_color.clone());
    line.page_number = config.page_number;
    line
}

fn is_too_short(line: &LineMark, canvas: Size, min_px: f64) -> bool {
    (line.dx() * canvas.width).abs() < min_px && (line.dy() * canvas.height).abs() < min_px
}

fn pointer_move(mut state: EditorState, point: Point, env: &ReduceEnv<'_>) -> EditorState {
    let threshold = env.threshold();
    match std::mem::take(&mut state.gesture) {
        Gesture::Idle => {}
        Gesture::Drawing { start } => {
            let line = drawn_line(start, point, env.canvas, env.config);
            let snapped = snap_drawn_line(&line, Endpoint::End, &state.scratch, threshold);
            state.preview = Some(snapped.value);
            state.guides = snapped.guides;
            state.gesture = Gesture::Drawing { start };
        }
        Gesture::DraggingMark(mut manipulation) => {
            manipulation.current_point = point;
            let id = manipulation.mark_id;
            let candidate = translate_mark(&manipulation.original, manipulation.delta());
            let (data, guides) = match candidate {
                MarkData::Line(line) => {
                    let snapped = snap_line_translation(&line, &state.scratch, Some(id), threshold);
                    (MarkData::Line(snapped.value), snapped.guides)
                }
                MarkData::Score(score) => {
                    let snapped = snap_score(&score, &state.scratch, Some(id), threshold);
                    (MarkData::Score(snapped.value), snapped.guides)
                }
            };
            state.set_scratch_data(id, data);
            state.guides = guides;
            state.gesture = Gesture::DraggingMark(manipulation);
        }
        Gesture::DraggingHandle {
            handle,
            mut manipulation,
        } => {
            manipulation.current_point = point;
            let id = manipulation.mark_id;
            if let MarkData::Line(original) = &manipulation.original {
                let target = original.endpoint(handle) + manipulation.delta();
                let resized = move_endpoint(original, handle, target);
                let snapped = snap_line_endpoint(
                    &resized,
                    handle,
                    &state.scratch,
                    Some(id),
                    threshold,
                    env.min_length(),
                );
                state.set_scratch_data(id, MarkData::Line(snapped.value));
                state.guides = snapped.guides;
            }
            state.gesture = Gesture::DraggingHandle {
                handle,
                manipulation,
            };
        }
    }
    state
}

fn pointer_up(state: EditorState, point: Point, env: &ReduceEnv<'_>) -> Reduced {
    let mut state = pointer_move(state, point, env);
    state.guides = SnapGuides::none();

    let op = match std::mem::take(&mut state.gesture) {
        Gesture::Idle => None,
        Gesture::Drawing { .. } => match state.preview.take() {
            Some(line) if !is_too_short(&line, env.canvas, env.config.min_line_length_px) => {
                Some(MarkOp::Add(MarkData::Line(line)))
            }
            _ => {
                log::debug!("Discarding degenerate line");
                None
            }
        },
        Gesture::DraggingHandle { manipulation, .. } => {
            let id = manipulation.mark_id;
            let collapsed = state
                .scratch_data(id)
                .and_then(MarkData::as_line)
                .is_some_and(|line| {
                    line.is_degenerate()
                        || is_too_short(line, env.canvas, env.config.min_line_length_px)
                });
            if collapsed {
                log::debug!("Discarding resize of {} below minimum length", id);
                state.set_scratch_data(id, manipulation.original);
                None
            } else {
                finish_drag(&state, manipulation)
            }
        }
        Gesture::DraggingMark(manipulation) => finish_drag(&state, manipulation),
    };

    Reduced { state, op }
}

fn finish_drag(state: &EditorState, manipulation: ManipulationState) -> Option<MarkOp> {
    let id = manipulation.mark_id;
    match state.scratch_data(id) {
        Some(after) if *after != manipulation.original => Some(MarkOp::Update {
            id,
            before: manipulation.original,
            after: after.clone(),
        }),
        _ => None,
    }
}

fn cancel(mut state: EditorState, env: &ReduceEnv<'_>) -> EditorState {
    if !state.gesture.is_idle() {
        log::debug!("Gesture cancelled");
    }
    state.gesture = Gesture::Idle;
    state.guides = SnapGuides::none();
    state.preview = None;
    state.scratch = env.authoritative.to_vec();
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const CANVAS: Size = Size::new(1000.0, 1000.0);

    fn line_mark(x1: f64, y1: f64, x2: f64, y2: f64) -> Mark {
        Mark::new(
            Uuid::new_v4(),
            0,
            MarkData::Line(LineMark::new(x1, y1, x2, y2, "#000")),
        )
    }

    fn score_mark(x: f64, y: f64) -> Mark {
        Mark::new(
            Uuid::new_v4(),
            0,
            MarkData::Score(ScoreMark::new(x, y, "5", 20.0, "#000")),
        )
    }

    fn run(
        mut state: EditorState,
        events: &[GestureEvent],
        marks: &[Mark],
        config: &EditorConfig,
    ) -> (EditorState, Vec<MarkOp>) {
        let env = ReduceEnv {
            authoritative: marks,
            canvas: CANVAS,
            config,
        };
        let mut ops = Vec::new();
        for &event in events {
            let reduced = reduce(state, event, &env);
            state = reduced.state;
            ops.extend(reduced.op);
        }
        (state, ops)
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_draw_snaps_to_existing_endpoint() {
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let state = EditorState {
            mode: EditMode::Line,
            ..EditorState::new(marks.clone())
        };
        let config = EditorConfig::default();
        let (state, ops) = run(
            state,
            &[
                GestureEvent::Down(p(0.20, 0.60)),
                GestureEvent::Move(p(0.40, 0.61)),
                GestureEvent::Up(p(0.505, 0.60)),
            ],
            &marks,
            &config,
        );

        let [MarkOp::Add(MarkData::Line(line))] = ops.as_slice() else {
            panic!("expected one added line, got {ops:?}");
        };
        assert!((line.x2 - 0.50).abs() < 1e-12);
        assert!((line.x1 - 0.195).abs() < 1e-12);
        assert_eq!(line.y1, 0.60);
        assert_eq!(line.y2, 0.60);
        assert_eq!(state.mode, EditMode::Line);
        assert!(state.gesture.is_idle());
        assert!(state.guides.is_empty());
        assert!(state.preview.is_none());
    }

    #[test]
    fn test_draw_from_shared_start_snaps_free_end() {
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let state = EditorState {
            mode: EditMode::Line,
            ..EditorState::new(marks.clone())
        };
        let config = EditorConfig::default();
        let (_, ops) = run(
            state,
            &[GestureEvent::Down(p(0.10, 0.60)), GestureEvent::Up(p(0.505, 0.60))],
            &marks,
            &config,
        );
        let [MarkOp::Add(MarkData::Line(line))] = ops.as_slice() else {
            panic!("expected one added line");
        };
        assert!((line.x2 - 0.50).abs() < 1e-12);
        assert!((line.x1 - 0.095).abs() < 1e-12);
    }

    #[test]
    fn test_draw_preview_and_guides_during_move() {
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let state = EditorState {
            mode: EditMode::Line,
            ..EditorState::new(marks.clone())
        };
        let config = EditorConfig::default();
        let (state, ops) = run(
            state,
            &[GestureEvent::Down(p(0.20, 0.60)), GestureEvent::Move(p(0.503, 0.62))],
            &marks,
            &config,
        );
        assert!(ops.is_empty());
        let preview = state.preview.as_ref().unwrap();
        assert_eq!(preview.y2, 0.60);
        assert_eq!(state.guides.x, Some(0.50));
    }

    #[test]
    fn test_vertical_draw() {
        let state = EditorState {
            mode: EditMode::Line,
            ..EditorState::default()
        };
        let config = EditorConfig::default();
        let (_, ops) = run(
            state,
            &[GestureEvent::Down(p(0.30, 0.10)), GestureEvent::Up(p(0.32, 0.40))],
            &[],
            &config,
        );
        let [MarkOp::Add(MarkData::Line(line))] = ops.as_slice() else {
            panic!("expected one added line");
        };
        assert_eq!(line.x1, 0.30);
        assert_eq!(line.x2, 0.30);
        assert_eq!(line.y2, 0.40);
    }

    #[test]
    fn test_degenerate_draw_discarded() {
        let config = EditorConfig::default();
        for end in [p(0.40, 0.40), p(0.402, 0.401)] {
            let state = EditorState {
                mode: EditMode::Line,
                ..EditorState::default()
            };
            let (state, ops) = run(
                state,
                &[GestureEvent::Down(p(0.40, 0.40)), GestureEvent::Up(end)],
                &[],
                &config,
            );
            assert!(ops.is_empty());
            assert!(state.gesture.is_idle());
            assert!(state.preview.is_none());
        }
    }

    #[test]
    fn test_draw_clamps_out_of_canvas_pointer() {
        let state = EditorState {
            mode: EditMode::Line,
            ..EditorState::default()
        };
        let config = EditorConfig::default();
        let (_, ops) = run(
            state,
            &[GestureEvent::Down(p(0.5, 0.5)), GestureEvent::Up(p(1.7, 0.55))],
            &[],
            &config,
        );
        let [MarkOp::Add(data)] = ops.as_slice() else {
            panic!("expected one add");
        };
        assert!(data.is_in_range());
        assert_eq!(data.as_line().unwrap().x2, 1.0);
    }

    #[test]
    fn test_score_placement_resets_mode() {
        let config = EditorConfig::default();
        let state = EditorState {
            mode: EditMode::score(" 7 "),
            ..EditorState::default()
        };
        let (state, ops) = run(state, &[GestureEvent::Down(p(0.3, 0.4))], &[], &config);
        let [MarkOp::Add(MarkData::Score(score))] = ops.as_slice() else {
            panic!("expected one score");
        };
        assert_eq!(score.value, "7");
        assert_eq!(score.font_size, config.font_size);
        assert_eq!(state.mode, EditMode::Select);
        assert!(state.gesture.is_idle());
    }

    #[test]
    fn test_empty_label_aborts() {
        let config = EditorConfig::default();
        let state = EditorState {
            mode: EditMode::score("  "),
            ..EditorState::default()
        };
        let (state, ops) = run(state, &[GestureEvent::Down(p(0.3, 0.4))], &[], &config);
        assert!(ops.is_empty());
        assert_eq!(state.mode, EditMode::score("  "));
    }

    #[test]
    fn test_drag_line_emits_single_update() {
        let config = EditorConfig::default();
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let id = marks[0].id;
        let (state, ops) = run(
            EditorState::new(marks.clone()),
            &[
                GestureEvent::Down(p(0.30, 0.20)),
                GestureEvent::Move(p(0.35, 0.30)),
                GestureEvent::Move(p(0.40, 0.40)),
                GestureEvent::Up(p(0.40, 0.40)),
            ],
            &marks,
            &config,
        );
        assert_eq!(state.selected, Some(id));
        let [MarkOp::Update { id: op_id, before, after }] = ops.as_slice() else {
            panic!("expected one update, got {ops:?}");
        };
        assert_eq!(*op_id, id);
        assert_eq!(before, &marks[0].data);
        let line = after.as_line().unwrap();
        assert!((line.x1 - 0.20).abs() < 1e-12);
        assert!((line.y1 - 0.40).abs() < 1e-12);
        assert!((line.x2 - 0.60).abs() < 1e-12);
        // Scratch shows the result until the store reports back.
        assert_eq!(state.scratch[0].data, *after);
    }

    #[test]
    fn test_click_without_move_emits_nothing() {
        let config = EditorConfig::default();
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let (state, ops) = run(
            EditorState::new(marks.clone()),
            &[GestureEvent::Down(p(0.30, 0.20)), GestureEvent::Up(p(0.30, 0.20))],
            &marks,
            &config,
        );
        assert!(ops.is_empty());
        assert_eq!(state.selected, Some(marks[0].id));
    }

    #[test]
    fn test_click_on_empty_canvas_clears_selection() {
        let config = EditorConfig::default();
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let state = EditorState {
            selected: Some(marks[0].id),
            ..EditorState::new(marks.clone())
        };
        let (state, ops) = run(
            state,
            &[GestureEvent::Down(p(0.8, 0.8)), GestureEvent::Up(p(0.8, 0.8))],
            &marks,
            &config,
        );
        assert!(ops.is_empty());
        assert_eq!(state.selected, None);
    }

    #[test]
    fn test_handle_drag_leaves_other_end() {
        let config = EditorConfig::default();
        let marks = vec![
            line_mark(0.10, 0.20, 0.50, 0.20),
            line_mark(0.60, 0.70, 0.60, 0.90),
        ];
        let id = marks[0].id;
        let state = EditorState {
            selected: Some(id),
            ..EditorState::new(marks.clone())
        };
        let (_, ops) = run(
            state,
            &[
                GestureEvent::Down(p(0.10, 0.20)),
                GestureEvent::Move(p(0.05, 0.22)),
                GestureEvent::Up(p(0.03, 0.25)),
            ],
            &marks,
            &config,
        );
        let [MarkOp::Update { after, .. }] = ops.as_slice() else {
            panic!("expected one update");
        };
        let line = after.as_line().unwrap();
        assert_eq!(line.x2, 0.50);
        assert_eq!(line.y2, 0.20);
        assert!((line.x1 - 0.03).abs() < 1e-12);
        assert!((line.y1 - 0.25).abs() < 1e-12);
    }

    fn resize_start(to: Point) -> (EditorState, Vec<MarkOp>, Vec<Mark>) {
        let config = EditorConfig::default();
        let marks = vec![
            line_mark(0.20, 0.50, 0.60, 0.50),
            line_mark(0.60, 0.20, 0.90, 0.20),
        ];
        let state = EditorState {
            selected: Some(marks[0].id),
            ..EditorState::new(marks.clone())
        };
        let (state, ops) = run(
            state,
            &[
                GestureEvent::Down(p(0.20, 0.50)),
                GestureEvent::Move(to),
                GestureEvent::Up(to),
            ],
            &marks,
            &config,
        );
        (state, ops, marks)
    }

    #[test]
    fn test_handle_snap_skips_fixed_end() {
        // 0.60 is within snap reach but is where the end handle sits.
        let (_, ops, _) = resize_start(p(0.595, 0.50));
        let [MarkOp::Update { after, .. }] = ops.as_slice() else {
            panic!("expected one update");
        };
        let line = after.as_line().unwrap();
        assert!((line.x1 - 0.595).abs() < 1e-12);
        assert_eq!(line.x2, 0.60);
        assert!(!line.is_degenerate());
    }

    #[test]
    fn test_handle_drag_below_min_length_discarded() {
        let (state, ops, marks) = resize_start(p(0.599, 0.50));
        assert!(ops.is_empty());
        assert!(state.gesture.is_idle());
        assert_eq!(state.scratch, marks);
        assert!(state.guides.is_empty());
    }

    #[test]
    fn test_handle_drag_records_endpoint() {
        let config = EditorConfig::default();
        let marks = vec![line_mark(0.20, 0.50, 0.60, 0.50)];
        let id = marks[0].id;
        let state = EditorState {
            selected: Some(id),
            ..EditorState::new(marks.clone())
        };
        let (state, _) = run(state, &[GestureEvent::Down(p(0.60, 0.50))], &marks, &config);
        let Gesture::DraggingHandle { handle, manipulation } = &state.gesture else {
            panic!("expected a handle drag");
        };
        assert_eq!(*handle, Endpoint::End);
        assert_eq!(manipulation.mark_id, id);
    }

    #[test]
    fn test_score_drag_snaps_x_independently() {
        let config = EditorConfig::default();
        let marks = vec![score_mark(0.30, 0.10), score_mark(0.302, 0.60)];
        let id = marks[1].id;
        let (_, ops) = run(
            EditorState::new(marks.clone()),
            &[
                GestureEvent::Down(p(0.302, 0.60)),
                GestureEvent::Move(p(0.302, 0.70)),
                GestureEvent::Up(p(0.302, 0.80)),
            ],
            &marks,
            &config,
        );
        let [MarkOp::Update { id: op_id, after, .. }] = ops.as_slice() else {
            panic!("expected one update");
        };
        assert_eq!(*op_id, id);
        let score = after.as_score().unwrap();
        assert_eq!(score.x, 0.30);
        assert!((score.y - 0.80).abs() < 1e-12);
    }

    #[test]
    fn test_cancel_restores_authoritative() {
        let config = EditorConfig::default();
        let marks = vec![line_mark(0.10, 0.20, 0.50, 0.20)];
        let (state, ops) = run(
            EditorState::new(marks.clone()),
            &[
                GestureEvent::Down(p(0.30, 0.20)),
                GestureEvent::Move(p(0.60, 0.60)),
                GestureEvent::Cancel,
            ],
            &marks,
            &config,
        );
        assert!(ops.is_empty());
        assert!(state.gesture.is_idle());
        assert_eq!(state.scratch, marks);
        assert!(state.guides.is_empty());
    }

    #[test]
    fn test_second_down_during_gesture_ignored() {
        let config = EditorConfig::default();
        let state = EditorState {
            mode: EditMode::Line,
            ..EditorState::default()
        };
        let (state, _) = run(
            state,
            &[GestureEvent::Down(p(0.1, 0.1)), GestureEvent::Down(p(0.9, 0.9))],
            &[],
            &config,
        );
        assert_eq!(state.gesture, Gesture::Drawing { start: p(0.1, 0.1) });
    }
}
