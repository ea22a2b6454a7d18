//! Editor configuration.

use crate::input::TOUCH_SLOP;
use crate::marks::ScoreMark;
use crate::selection::{HANDLE_RADIUS, HIT_STROKE_WIDTH};
use crate::snap::SNAP_THRESHOLD_PX;
use crate::viewport::PINCH_EPSILON;
use serde::{Deserialize, Serialize};

/// Default color for new marks.
pub const DEFAULT_MARK_COLOR: &str = "#e53935";

/// Tunables for a [`Session`](crate::session::Session).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap radius in canvas pixels.
    pub snap_threshold_px: f64,
    /// A drawn line shorter than this on both axes is discarded.
    pub min_line_length_px: f64,
    /// Touch movement before a touch becomes a drag.
    pub touch_slop_px: f64,
    /// Endpoint handle hit radius.
    pub handle_radius_px: f64,
    /// Width of the invisible hit stroke around lines.
    pub hit_stroke_px: f64,
    /// Scale-ratio changes below this are ignored during a pinch.
    pub pinch_epsilon: f64,
    /// Normalized offset applied to duplicated marks.
    pub duplicate_offset: f64,
    pub line_color: String,
    pub score_color: String,
    /// Font size of new score marks.
    pub font_size: f64,
    /// Page stamped on new marks.
    pub page_number: u32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: SNAP_THRESHOLD_PX,
            min_line_length_px: 4.0,
            touch_slop_px: TOUCH_SLOP,
            handle_radius_px: HANDLE_RADIUS,
            hit_stroke_px: HIT_STROKE_WIDTH,
            pinch_epsilon: PINCH_EPSILON,
            duplicate_offset: 0.02,
            line_color: DEFAULT_MARK_COLOR.to_string(),
            score_color: DEFAULT_MARK_COLOR.to_string(),
            font_size: ScoreMark::DEFAULT_FONT_SIZE,
            page_number: 1,
        }
    }
}

impl EditorConfig {
    /// Parse a (possibly partial) JSON config. Only an object is accepted.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(serde::de::Error::custom("editor config must be a JSON object"));
        }
        serde_json::from_value(value)
    }
}
