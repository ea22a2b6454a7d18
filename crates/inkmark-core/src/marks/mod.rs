//! Mark definitions for the annotation layer.
//!
//! All coordinates live in a normalized space where both axes span `[0, 1]`
//! relative to the displayed image box.

mod line;
mod score;

pub use line::{Endpoint, LineMark};
pub use score::ScoreMark;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for persisted marks (assigned by the store).
pub type MarkId = Uuid;

/// Clamp a normalized coordinate into `[0, 1]`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// Check that a normalized coordinate is inside `[0, 1]`.
pub fn in_unit_range(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Kind discriminator, mostly for logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Line,
    Score,
}

impl std::fmt::Display for MarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkKind::Line => f.write_str("line"),
            MarkKind::Score => f.write_str("score"),
        }
    }
}

/// Type-specific mark payload, without identity.
///
/// This is what gets handed to the store when creating a mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkData {
    Line(LineMark),
    Score(ScoreMark),
}

impl MarkData {
    pub fn kind(&self) -> MarkKind {
        match self {
            MarkData::Line(_) => MarkKind::Line,
            MarkData::Score(_) => MarkKind::Score,
        }
    }

    pub fn as_line(&self) -> Option<&LineMark> {
        match self {
            MarkData::Line(line) => Some(line),
            MarkData::Score(_) => None,
        }
    }

    pub fn as_score(&self) -> Option<&ScoreMark> {
        match self {
            MarkData::Score(score) => Some(score),
            MarkData::Line(_) => None,
        }
    }

    pub fn color(&self) -> &str {
        match self {
            MarkData::Line(line) => &line.color,
            MarkData::Score(score) => &score.color,
        }
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        match self {
            MarkData::Line(line) => line.color = color.into(),
            MarkData::Score(score) => score.color = color.into(),
        }
    }

    /// Check that every coordinate is inside `[0, 1]`.
    pub fn is_in_range(&self) -> bool {
        match self {
            MarkData::Line(line) => {
                [line.x1, line.y1, line.x2, line.y2].into_iter().all(in_unit_range)
            }
            MarkData::Score(score) => in_unit_range(score.x) && in_unit_range(score.y),
        }
    }

    /// Clamp every coordinate into `[0, 1]`.
    pub fn clamped(mut self) -> Self {
        match &mut self {
            MarkData::Line(line) => {
                line.x1 = clamp_unit(line.x1);
                line.y1 = clamp_unit(line.y1);
                line.x2 = clamp_unit(line.x2);
                line.y2 = clamp_unit(line.y2);
            }
            MarkData::Score(score) => {
                score.x = clamp_unit(score.x);
                score.y = clamp_unit(score.y);
            }
        }
        self
    }

    /// Apply a partial update. The variant of a mark never changes.
    pub fn apply_patch(&mut self, patch: &MarkPatch) -> Result<(), PatchError> {
        match (self, patch) {
            (MarkData::Line(line), MarkPatch::Line(p)) => {
                if let Some(v) = p.x1 {
                    line.x1 = v;
                }
                if let Some(v) = p.y1 {
                    line.y1 = v;
                }
                if let Some(v) = p.x2 {
                    line.x2 = v;
                }
                if let Some(v) = p.y2 {
                    line.y2 = v;
                }
                if let Some(color) = &p.color {
                    line.color = color.clone();
                }
                Ok(())
            }
            (MarkData::Score(score), MarkPatch::Score(p)) => {
                if let Some(v) = p.x {
                    score.x = v;
                }
                if let Some(v) = p.y {
                    score.y = v;
                }
                if let Some(value) = &p.value {
                    score.value = value.clone();
                }
                if let Some(size) = p.font_size {
                    score.font_size = size;
                }
                if let Some(color) = &p.color {
                    score.color = color.clone();
                }
                Ok(())
            }
            (data, patch) => Err(PatchError::TypeMismatch {
                mark: data.kind(),
                patch: patch.kind(),
            }),
        }
    }
}

/// A persisted mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub id: MarkId,
    /// Creation timestamp in milliseconds since the Unix epoch. Opaque.
    #[serde(default)]
    pub created_at: u64,
    #[serde(flatten)]
    pub data: MarkData,
}

impl Mark {
    pub fn new(id: MarkId, created_at: u64, data: MarkData) -> Self {
        Self {
            id,
            created_at,
            data,
        }
    }

    pub fn kind(&self) -> MarkKind {
        self.data.kind()
    }
}

/// Find a mark by id in a list.
pub fn find_mark(marks: &[Mark], id: MarkId) -> Option<&Mark> {
    marks.iter().find(|m| m.id == id)
}

/// Errors from applying a patch to mark data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("cannot apply a {patch} patch to a {mark} mark")]
    TypeMismatch { mark: MarkKind, patch: MarkKind },
}

/// Partial update for a line mark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Partial update for a score mark.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScorePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Partial update payload handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkPatch {
    Line(LinePatch),
    Score(ScorePatch),
}

fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
    if before == after {
        None
    } else {
        Some(after.clone())
    }
}

impl MarkPatch {
    pub fn kind(&self) -> MarkKind {
        match self {
            MarkPatch::Line(_) => MarkKind::Line,
            MarkPatch::Score(_) => MarkKind::Score,
        }
    }

    /// Patch carrying only the fields that differ between `before` and `after`.
    ///
    /// Returns `None` when nothing changed or the variants differ.
    pub fn diff(before: &MarkData, after: &MarkData) -> Option<Self> {
        match (before, after) {
            (MarkData::Line(b), MarkData::Line(a)) => {
                let patch = LinePatch {
                    x1: changed(&b.x1, &a.x1),
                    y1: changed(&b.y1, &a.y1),
                    x2: changed(&b.x2, &a.x2),
                    y2: changed(&b.y2, &a.y2),
                    color: changed(&b.color, &a.color),
                };
                (patch != LinePatch::default()).then_some(MarkPatch::Line(patch))
            }
            (MarkData::Score(b), MarkData::Score(a)) => {
                let patch = ScorePatch {
                    x: changed(&b.x, &a.x),
                    y: changed(&b.y, &a.y),
                    value: changed(&b.value, &a.value),
                    font_size: changed(&b.font_size, &a.font_size),
                    color: changed(&b.color, &a.color),
                };
                (patch != ScorePatch::default()).then_some(MarkPatch::Score(patch))
            }
            _ => None,
        }
    }

    /// Patch writing back every mutable field of `data`.
    pub fn replace(data: &MarkData) -> Self {
        match data {
            MarkData::Line(line) => MarkPatch::Line(LinePatch {
                x1: Some(line.x1),
                y1: Some(line.y1),
                x2: Some(line.x2),
                y2: Some(line.y2),
                color: Some(line.color.clone()),
            }),
            MarkData::Score(score) => MarkPatch::Score(ScorePatch {
                x: Some(score.x),
                y: Some(score.y),
                value: Some(score.value.clone()),
                font_size: Some(score.font_size),
                color: Some(score.color.clone()),
            }),
        }
    }

    /// Check that every coordinate carried by the patch is inside `[0, 1]`.
    pub fn is_in_range(&self) -> bool {
        match self {
            MarkPatch::Line(p) => [p.x1, p.y1, p.x2, p.y2]
                .into_iter()
                .flatten()
                .all(in_unit_range),
            MarkPatch::Score(p) => [p.x, p.y].into_iter().flatten().all(in_unit_range),
        }
    }
}
