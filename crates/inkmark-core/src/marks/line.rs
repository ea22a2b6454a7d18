//! Line mark.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Which end of a line a handle refers to.
///
/// Start and end carry no direction; they only identify handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Start,
    End,
}

impl Endpoint {
    /// The endpoint held fixed while this one is dragged.
    pub fn opposite(self) -> Self {
        match self {
            Endpoint::Start => Endpoint::End,
            Endpoint::End => Endpoint::Start,
        }
    }
}

/// A straight segment between two normalized endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMark {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub color: String,
    #[serde(default = "default_page")]
    pub page_number: u32,
}

pub(super) fn default_page() -> u32 {
    1
}

impl LineMark {
    /// Create a line on the first page.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64, color: impl Into<String>) -> Self {
        Self {
            x1,
            y1,
            x2,
            y2,
            color: color.into(),
            page_number: default_page(),
        }
    }

    /// Create a line between two points.
    pub fn from_points(start: Point, end: Point, color: impl Into<String>) -> Self {
        Self::new(start.x, start.y, end.x, end.y, color)
    }

    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    pub fn endpoint(&self, which: Endpoint) -> Point {
        match which {
            Endpoint::Start => self.start(),
            Endpoint::End => self.end(),
        }
    }

    pub fn set_endpoint(&mut self, which: Endpoint, point: Point) {
        match which {
            Endpoint::Start => {
                self.x1 = point.x;
                self.y1 = point.y;
            }
            Endpoint::End => {
                self.x2 = point.x;
                self.y2 = point.y;
            }
        }
    }

    pub fn dx(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn dy(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Both endpoints coincide.
    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 && self.y1 == self.y2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let mut line = LineMark::new(0.1, 0.2, 0.5, 0.2, "#000");
        assert_eq!(line.endpoint(Endpoint::Start), Point::new(0.1, 0.2));
        assert_eq!(line.endpoint(Endpoint::End), Point::new(0.5, 0.2));

        line.set_endpoint(Endpoint::Start, Point::new(0.0, 0.3));
        assert_eq!(line.start(), Point::new(0.0, 0.3));
        assert_eq!(line.end(), Point::new(0.5, 0.2));
        assert_eq!(Endpoint::Start.opposite(), Endpoint::End);
    }

    #[test]
    fn test_degenerate() {
        assert!(LineMark::new(0.4, 0.4, 0.4, 0.4, "#000").is_degenerate());
        assert!(!LineMark::new(0.4, 0.4, 0.4, 0.5, "#000").is_degenerate());
    }
}
