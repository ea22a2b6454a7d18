//! Classification and endpoint collection over line marks.
//!
//! Pure functions; everything here works in normalized mark space.

use crate::marks::{LineMark, Mark, MarkData, MarkId};
use serde::{Deserialize, Serialize};

/// Orientation class of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// `|dx| > |dy|`.
    Horizontal,
    /// `|dy| > |dx|`.
    Vertical,
    /// `|dx| == |dy|`, including zero-length lines. Never snaps.
    Diagonal,
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub fn other(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        }
    }
}

/// The two independently snappable extremities of a line along its axis.
///
/// Left/right for horizontal lines, top/bottom for vertical lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min: f64,
    pub max: f64,
}

impl Extent {
    pub fn as_array(self) -> [f64; 2] {
        [self.min, self.max]
    }
}

pub fn orientation(line: &LineMark) -> Orientation {
    let dx = line.dx().abs();
    let dy = line.dy().abs();
    if dx > dy {
        Orientation::Horizontal
    } else if dy > dx {
        Orientation::Vertical
    } else {
        Orientation::Diagonal
    }
}

pub fn is_horizontal(line: &LineMark) -> bool {
    orientation(line) == Orientation::Horizontal
}

pub fn is_vertical(line: &LineMark) -> bool {
    orientation(line) == Orientation::Vertical
}

/// The axis along which a line's extremities snap.
pub fn snap_axis(line: &LineMark) -> Option<Axis> {
    match orientation(line) {
        Orientation::Horizontal => Some(Axis::X),
        Orientation::Vertical => Some(Axis::Y),
        Orientation::Diagonal => None,
    }
}

/// Extremities of a line along its snap axis.
pub fn extremities(line: &LineMark) -> Option<Extent> {
    match orientation(line) {
        Orientation::Horizontal => Some(Extent {
            min: line.x1.min(line.x2),
            max: line.x1.max(line.x2),
        }),
        Orientation::Vertical => Some(Extent {
            min: line.y1.min(line.y2),
            max: line.y1.max(line.y2),
        }),
        Orientation::Diagonal => None,
    }
}

/// Coordinate of a line across its own axis: x of a vertical line, y of a
/// horizontal one.
pub fn cross_coordinate(line: &LineMark) -> Option<f64> {
    match orientation(line) {
        Orientation::Horizontal => Some((line.y1 + line.y2) / 2.0),
        Orientation::Vertical => Some((line.x1 + line.x2) / 2.0),
        Orientation::Diagonal => None,
    }
}

fn lines<'a>(marks: &'a [Mark], exclude: Option<MarkId>) -> impl Iterator<Item = &'a LineMark> + 'a {
    marks
        .iter()
        .filter(move |m| Some(m.id) != exclude)
        .filter_map(|m| m.data.as_line())
}

/// Extremities of every line whose snap axis is `axis`, in mark order.
pub fn collect_endpoints(marks: &[Mark], axis: Axis, exclude: Option<MarkId>) -> Vec<f64> {
    lines(marks, exclude)
        .filter(|line| snap_axis(line) == Some(axis))
        .filter_map(extremities)
        .flat_map(Extent::as_array)
        .collect()
}

/// Cross coordinates of lines perpendicular to `axis`, in mark order.
///
/// For `Axis::X` these are the x positions of vertical lines, which lets a
/// horizontal line end exactly on a vertical one.
pub fn collect_cross_coordinates(marks: &[Mark], axis: Axis, exclude: Option<MarkId>) -> Vec<f64> {
    lines(marks, exclude)
        .filter(|line| snap_axis(line) == Some(axis.other()))
        .filter_map(cross_coordinate)
        .collect()
}

/// Anchor coordinates of every score mark along `axis`, in mark order.
pub fn collect_anchors(marks: &[Mark], axis: Axis, exclude: Option<MarkId>) -> Vec<f64> {
    marks
        .iter()
        .filter(|m| Some(m.id) != exclude)
        .filter_map(|m| match &m.data {
            MarkData::Score(score) => Some(match axis {
                Axis::X => score.x,
                Axis::Y => score.y,
            }),
            MarkData::Line(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marks::ScoreMark;
    use uuid::Uuid;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> LineMark {
        LineMark::new(x1, y1, x2, y2, "#000")
    }

    fn mark(data: MarkData) -> Mark {
        Mark::new(Uuid::new_v4(), 0, data)
    }

    #[test]
    fn test_classification_exclusive() {
        let cases = [
            (line(0.1, 0.1, 0.5, 0.2), true, false),
            (line(0.1, 0.1, 0.2, 0.5), false, true),
            (line(0.1, 0.1, 0.3, 0.3), false, false),
            (line(0.3, 0.1, 0.1, 0.3), false, false),
            (line(0.2, 0.2, 0.2, 0.2), false, false),
        ];
        for (l, h, v) in cases {
            assert_eq!(is_horizontal(&l), h);
            assert_eq!(is_vertical(&l), v);
            assert!(!(is_horizontal(&l) && is_vertical(&l)));
        }
    }

    #[test]
    fn test_extremities_ignore_direction() {
        let ext = extremities(&line(0.5, 0.2, 0.1, 0.2)).unwrap();
        assert_eq!(ext, Extent { min: 0.1, max: 0.5 });

        let ext = extremities(&line(0.3, 0.9, 0.3, 0.4)).unwrap();
        assert_eq!(ext, Extent { min: 0.4, max: 0.9 });

        assert!(extremities(&line(0.1, 0.1, 0.2, 0.2)).is_none());
    }

    #[test]
    fn test_collect_excludes_and_filters() {
        let h = mark(MarkData::Line(line(0.1, 0.2, 0.5, 0.2)));
        let v = mark(MarkData::Line(line(0.7, 0.1, 0.7, 0.6)));
        let d = mark(MarkData::Line(line(0.1, 0.1, 0.3, 0.3)));
        let s = mark(MarkData::Score(ScoreMark::new(0.3, 0.8, "4", 20.0, "#000")));
        let marks = vec![h.clone(), v.clone(), d, s.clone()];

        assert_eq!(collect_endpoints(&marks, Axis::X, None), vec![0.1, 0.5]);
        assert_eq!(collect_endpoints(&marks, Axis::Y, None), vec![0.1, 0.6]);
        assert!(collect_endpoints(&marks, Axis::X, Some(h.id)).is_empty());

        assert_eq!(collect_cross_coordinates(&marks, Axis::X, None), vec![0.7]);
        assert_eq!(collect_cross_coordinates(&marks, Axis::Y, None), vec![0.2]);
        assert!(collect_cross_coordinates(&marks, Axis::X, Some(v.id)).is_empty());

        assert_eq!(collect_anchors(&marks, Axis::X, None), vec![0.3]);
        assert_eq!(collect_anchors(&marks, Axis::Y, None), vec![0.8]);
        assert!(collect_anchors(&marks, Axis::Y, Some(s.id)).is_empty());
    }
}
