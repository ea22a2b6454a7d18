//! Score (text label) mark.

use super::line::default_page;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Approximate glyph advance as a fraction of the font size.
const GLYPH_WIDTH_RATIO: f64 = 0.6;

/// A single-line text label anchored at its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreMark {
    pub x: f64,
    pub y: f64,
    pub value: String,
    /// Font size in canvas pixels.
    pub font_size: f64,
    pub color: String,
    #[serde(default = "default_page")]
    pub page_number: u32,
}

impl ScoreMark {
    /// Default font size for new labels.
    pub const DEFAULT_FONT_SIZE: f64 = 24.0;

    /// Create a label on the first page.
    pub fn new(
        x: f64,
        y: f64,
        value: impl Into<String>,
        font_size: f64,
        color: impl Into<String>,
    ) -> Self {
        Self {
            x,
            y,
            value: value.into(),
            font_size,
            color: color.into(),
            page_number: default_page(),
        }
    }

    pub fn anchor(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_anchor(&mut self, point: Point) {
        self.x = point.x;
        self.y = point.y;
    }

    /// Approximate rendered size in canvas pixels.
    ///
    /// No text layout happens in the engine, so this uses a fixed glyph
    /// advance. Good enough for hit testing.
    pub fn approximate_size(&self) -> Size {
        let chars = self.value.chars().count().max(1) as f64;
        Size::new(chars * self.font_size * GLYPH_WIDTH_RATIO, self.font_size)
    }
}
