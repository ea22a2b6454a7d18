//! Selection handles, hit testing and mark mutation helpers.
//!
//! Hit testing happens in canvas pixels so hit zones keep a constant on-screen
//! size whatever the canvas resolution. Mutation helpers work in normalized
//! space and always return in-range coordinates.

use crate::marks::{Endpoint, LineMark, Mark, MarkData, MarkId, ScoreMark, clamp_unit};
use kurbo::{Point, Rect, Size, Vec2};

/// Default endpoint handle hit radius in canvas pixels.
pub const HANDLE_RADIUS: f64 = 12.0;
/// Default width of the invisible hit stroke around lines, in canvas pixels.
pub const HIT_STROKE_WIDTH: f64 = 16.0;

/// Convert a normalized point into canvas pixels.
pub fn to_canvas_px(point: Point, canvas: Size) -> Point {
    Point::new(point.x * canvas.width, point.y * canvas.height)
}

/// Convert a canvas pixel position into normalized space (not clamped).
pub fn to_normalized(point: Point, canvas: Size) -> Point {
    let norm = |v: f64, extent: f64| if extent > 0.0 { v / extent } else { 0.0 };
    Point::new(norm(point.x, canvas.width), norm(point.y, canvas.height))
}

/// Clamp a normalized point into the unit square.
pub fn clamp_point(point: Point) -> Point {
    Point::new(clamp_unit(point.x), clamp_unit(point.y))
}

/// Distance from a point to a line segment.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// An endpoint handle of the selected line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// Position in canvas pixels.
    pub position: Point,
    pub endpoint: Endpoint,
}

impl Handle {
    pub fn new(position: Point, endpoint: Endpoint) -> Self {
        Self { position, endpoint }
    }

    /// Check if a point (in canvas pixels) falls inside the circular hit zone.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        (point - self.position).hypot2() <= radius * radius
    }
}

/// Both handles of a line, start first.
pub fn get_handles(line: &LineMark, canvas: Size) -> [Handle; 2] {
    [
        Handle::new(to_canvas_px(line.start(), canvas), Endpoint::Start),
        Handle::new(to_canvas_px(line.end(), canvas), Endpoint::End),
    ]
}

/// Find which handle of `line` (if any) is hit at a normalized point.
pub fn hit_test_handles(line: &LineMark, point: Point, canvas: Size, radius: f64) -> Option<Endpoint> {
    let px = to_canvas_px(point, canvas);
    get_handles(line, canvas)
        .into_iter()
        .find(|handle| handle.hit_test(px, radius))
        .map(|handle| handle.endpoint)
}

/// Approximate text box of a score label, in canvas pixels.
pub fn score_bounds(score: &ScoreMark, canvas: Size) -> Rect {
    let center = to_canvas_px(score.anchor(), canvas);
    Rect::from_center_size(center, score.approximate_size())
}

/// Check whether a normalized point hits a single mark.
pub fn hit_test_mark(data: &MarkData, point: Point, canvas: Size, hit_stroke: f64) -> bool {
    let px = to_canvas_px(point, canvas);
    match data {
        MarkData::Line(line) => {
            let a = to_canvas_px(line.start(), canvas);
            let b = to_canvas_px(line.end(), canvas);
            point_to_segment_dist(px, a, b) <= hit_stroke / 2.0
        }
        MarkData::Score(score) => score_bounds(score, canvas).contains(px),
    }
}

/// Topmost mark under a normalized point. Later marks are drawn on top.
pub fn hit_test_marks(marks: &[Mark], point: Point, canvas: Size, hit_stroke: f64) -> Option<MarkId> {
    marks
        .iter()
        .rev()
        .find(|mark| hit_test_mark(&mark.data, point, canvas, hit_stroke))
        .map(|mark| mark.id)
}

/// Clamp a displacement so `[lo, hi]` moved by it stays inside `[0, 1]`.
fn clamp_shift(delta: f64, lo: f64, hi: f64) -> f64 {
    let min = -lo;
    let max = 1.0 - hi;
    if min > max {
        // Already out of range; the final per-coordinate clamp fixes it.
        return 0.0;
    }
    if delta.is_nan() {
        return 0.0;
    }
    delta.clamp(min, max)
}

/// Translate a line, stopping at the canvas border so it keeps its length.
pub fn translate_line(line: &LineMark, delta: Vec2) -> LineMark {
    let dx = clamp_shift(delta.x, line.x1.min(line.x2), line.x1.max(line.x2));
    let dy = clamp_shift(delta.y, line.y1.min(line.y2), line.y1.max(line.y2));
    LineMark {
        x1: clamp_unit(line.x1 + dx),
        y1: clamp_unit(line.y1 + dy),
        x2: clamp_unit(line.x2 + dx),
        y2: clamp_unit(line.y2 + dy),
        ..line.clone()
    }
}

pub fn translate_score(score: &ScoreMark, delta: Vec2) -> ScoreMark {
    let mut moved = score.clone();
    moved.set_anchor(clamp_point(score.anchor() + delta));
    moved
}

/// Translate any mark by a normalized delta.
pub fn translate_mark(data: &MarkData, delta: Vec2) -> MarkData {
    match data {
        MarkData::Line(line) => MarkData::Line(translate_line(line, delta)),
        MarkData::Score(score) => MarkData::Score(translate_score(score, delta)),
    }
}

/// Move one endpoint of a line to a normalized position. The other endpoint
/// is left exactly as it was.
pub fn move_endpoint(line: &LineMark, endpoint: Endpoint, position: Point) -> LineMark {
    let mut resized = line.clone();
    resized.set_endpoint(endpoint, clamp_point(position));
    resized
}

/// State of an active drag of a single mark.
#[derive(Debug, Clone, PartialEq)]
pub struct ManipulationState {
    /// The mark being manipulated.
    pub mark_id: MarkId,
    /// Pointer position at drag start, normalized.
    pub start_point: Point,
    /// Current pointer position, normalized.
    pub current_point: Point,
    /// Pre-drag snapshot; every frame is computed from it.
    pub original: MarkData,
}

impl ManipulationState {
    pub fn new(mark_id: MarkId, start_point: Point, original: MarkData) -> Self {
        Self {
            mark_id,
            start_point,
            current_point: start_point,
            original,
        }
    }

    /// Cumulative pointer displacement since drag start.
    pub fn delta(&self) -> Vec2 {
        self.current_point - self.start_point
    }
}
