//! Alignment snapping for lines and score labels.
//!
//! Snapping works per axis: a candidate coordinate is pulled onto the
//! nearest target coordinate within a threshold measured in canvas pixels.
//! The result carries guides for the renderer to draw dashed alignment lines.

use crate::geometry::{self, Axis};
use crate::marks::{Endpoint, LineMark, Mark, MarkId, ScoreMark, in_unit_range};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Snap distance in canvas pixels.
pub const SNAP_THRESHOLD_PX: f64 = 10.0;

/// Snap radius converted to normalized units, per axis.
///
/// Derived from the canvas layout size, not from the pinch zoom, so the
/// radius follows unzoomed screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapThreshold {
    pub x: f64,
    pub y: f64,
}

impl SnapThreshold {
    pub fn from_canvas(threshold_px: f64, canvas: Size) -> Self {
        let norm = |extent: f64| {
            if extent > 0.0 {
                threshold_px / extent
            } else {
                0.0
            }
        };
        Self {
            x: norm(canvas.width),
            y: norm(canvas.height),
        }
    }

    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

/// Alignment guides to render. Each spans the whole canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapGuides {
    /// Vertical guide at this x (an x snap happened).
    pub x: Option<f64>,
    /// Horizontal guide at this y (a y snap happened).
    pub y: Option<f64>,
}

impl SnapGuides {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }

    fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = Some(value),
            Axis::Y => self.y = Some(value),
        }
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult<T> {
    /// The possibly corrected value.
    pub value: T,
    /// Guides to render; empty when nothing snapped.
    pub guides: SnapGuides,
}

impl<T> SnapResult<T> {
    /// Create a result with no snapping.
    pub fn none(value: T) -> Self {
        Self {
            value,
            guides: SnapGuides::none(),
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }
}

/// A winning extremity/target pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapMatch {
    /// Amount to add to the candidate coordinate(s).
    pub offset: f64,
    /// The coordinate snapped onto.
    pub target: f64,
}

/// Find the closest target for any of the candidate coordinates.
///
/// Ties keep the first pair found: candidates in order, then targets in
/// order. Pairs whose offset would move any candidate out of `[0, 1]` are
/// skipped.
pub fn nearest_offset(candidates: &[f64], targets: &[f64], threshold: f64) -> Option<SnapMatch> {
    let lo = candidates.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = candidates.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    nearest_offset_within(candidates, targets, threshold, (lo, hi))
}

/// Like [`nearest_offset`], but the range check applies to `span`, the
/// coordinates that move along with the candidates.
fn nearest_offset_within(
    candidates: &[f64],
    targets: &[f64],
    threshold: f64,
    span: (f64, f64),
) -> Option<SnapMatch> {
    let mut best: Option<SnapMatch> = None;
    let mut best_dist = threshold;

    for &candidate in candidates {
        for &target in targets {
            let offset = target - candidate;
            let dist = offset.abs();
            if dist > best_dist {
                continue;
            }
            if best.is_some() && dist >= best_dist {
                continue;
            }
            if !(in_unit_range(span.0 + offset) && in_unit_range(span.1 + offset)) {
                continue;
            }
            best_dist = dist;
            best = Some(SnapMatch { offset, target });
        }
    }

    best
}

/// Snap a single coordinate onto the nearest target.
pub fn snap_value(value: f64, targets: &[f64], threshold: f64) -> Option<f64> {
    nearest_offset(&[value], targets, threshold).map(|m| m.target)
}

fn shift_axis(line: &mut LineMark, axis: Axis, offset: f64) {
    match axis {
        Axis::X => {
            line.x1 += offset;
            line.x2 += offset;
        }
        Axis::Y => {
            line.y1 += offset;
            line.y2 += offset;
        }
    }
}

fn translation_targets(line: &LineMark, marks: &[Mark], exclude: Option<MarkId>) -> Option<(Axis, Vec<f64>)> {
    let axis = geometry::snap_axis(line)?;
    let mut targets = geometry::collect_endpoints(marks, axis, exclude);
    targets.extend(geometry::collect_cross_coordinates(marks, axis, exclude));
    Some((axis, targets))
}

fn shifted(line: &LineMark, axis: Axis, found: Option<SnapMatch>) -> SnapResult<LineMark> {
    match found {
        Some(found) => {
            let mut snapped = line.clone();
            shift_axis(&mut snapped, axis, found.offset);
            let mut guides = SnapGuides::none();
            guides.set(axis, found.target);
            SnapResult {
                value: snapped,
                guides,
            }
        }
        None => SnapResult::none(line.clone()),
    }
}

/// Slide a whole line along its axis so one of its extremities aligns.
///
/// Used while dragging an existing line. Both extremities are tested against
/// the same-axis extremities of other lines and the cross coordinates of
/// perpendicular lines. Length and direction are preserved. Diagonal lines
/// never snap.
pub fn snap_line_translation(
    line: &LineMark,
    marks: &[Mark],
    exclude: Option<MarkId>,
    threshold: SnapThreshold,
) -> SnapResult<LineMark> {
    let (Some((axis, targets)), Some(extent)) =
        (translation_targets(line, marks, exclude), geometry::extremities(line))
    else {
        return SnapResult::none(line.clone());
    };

    let found = nearest_offset(&extent.as_array(), &targets, threshold.along(axis));
    shifted(line, axis, found)
}

/// Slide a line being drawn so its free endpoint aligns.
///
/// Only the endpoint under the pointer is a candidate; the targets are the
/// same as for [`snap_line_translation`]. The fixed start moves by the same
/// offset so the drawn length is kept.
pub fn snap_drawn_line(
    line: &LineMark,
    free: Endpoint,
    marks: &[Mark],
    threshold: SnapThreshold,
) -> SnapResult<LineMark> {
    let (Some((axis, targets)), Some(extent)) =
        (translation_targets(line, marks, None), geometry::extremities(line))
    else {
        return SnapResult::none(line.clone());
    };

    let point = line.endpoint(free);
    let candidate = match axis {
        Axis::X => point.x,
        Axis::Y => point.y,
    };
    let found = nearest_offset_within(
        &[candidate],
        &targets,
        threshold.along(axis),
        (extent.min, extent.max),
    );
    shifted(line, axis, found)
}

/// Snap only the dragged endpoint of a line being resized.
///
/// The opposite endpoint is never touched. Targets are same-axis extremities
/// of other lines only. A target that would leave the line shorter than
/// `min_length` on both axes is skipped.
pub fn snap_line_endpoint(
    line: &LineMark,
    handle: Endpoint,
    marks: &[Mark],
    exclude: Option<MarkId>,
    threshold: SnapThreshold,
    min_length: SnapThreshold,
) -> SnapResult<LineMark> {
    let Some(axis) = geometry::snap_axis(line) else {
        return SnapResult::none(line.clone());
    };

    let point = line.endpoint(handle);
    let fixed = line.endpoint(handle.opposite());
    let (coordinate, anchor, cross_span) = match axis {
        Axis::X => (point.x, fixed.x, (point.y - fixed.y).abs()),
        Axis::Y => (point.y, fixed.y, (point.x - fixed.x).abs()),
    };
    let long_across = cross_span >= min_length.along(axis.other());
    let targets: Vec<f64> = geometry::collect_endpoints(marks, axis, exclude)
        .into_iter()
        .filter(|&target| long_across || (target - anchor).abs() >= min_length.along(axis))
        .collect();

    match snap_value(coordinate, &targets, threshold.along(axis)) {
        Some(target) => {
            let mut snapped = line.clone();
            let mut moved = point;
            match axis {
                Axis::X => moved.x = target,
                Axis::Y => moved.y = target,
            }
            snapped.set_endpoint(handle, moved);
            let mut guides = SnapGuides::none();
            guides.set(axis, target);
            SnapResult {
                value: snapped,
                guides,
            }
        }
        None => SnapResult::none(line.clone()),
    }
}

/// Snap a score label's anchor against other labels, x and y independently.
///
/// Lines are not targets for labels.
pub fn snap_score(
    score: &ScoreMark,
    marks: &[Mark],
    exclude: Option<MarkId>,
    threshold: SnapThreshold,
) -> SnapResult<ScoreMark> {
    let mut snapped = score.clone();
    let mut guides = SnapGuides::none();

    for axis in [Axis::X, Axis::Y] {
        let targets = geometry::collect_anchors(marks, axis, exclude);
        let current = match axis {
            Axis::X => score.x,
            Axis::Y => score.y,
        };
        if let Some(target) = snap_value(current, &targets, threshold.along(axis)) {
            match axis {
                Axis::X => snapped.x = target,
                Axis::Y => snapped.y = target,
            }
            guides.set(axis, target);
        }
    }

    SnapResult {
        value: snapped,
        guides,
    }
}
