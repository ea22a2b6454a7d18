//! Pinch-zoom viewport transform for the canvas layer.

use kurbo::{Affine, Point};

/// Scale-ratio changes smaller than this are ignored during a pinch.
pub const PINCH_EPSILON: f64 = 0.01;

/// Values cached when a pinch starts and used for the whole gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinchState {
    /// Matrix at pinch start (`M0`).
    pub start_matrix: Affine,
    /// Inverse of `M0`.
    pub start_inverse: Affine,
    /// Pinch center in canvas-local coordinates.
    pub center: Point,
    /// Finger distance at pinch start, in device pixels.
    pub initial_distance: f64,
    /// Last ratio applied to the matrix.
    pub last_ratio: f64,
}

/// Viewport manages the canvas layer transform.
///
/// The matrix maps canvas-local coordinates to device coordinates. It only
/// carries scale and translation. Mark coordinates are never affected by it;
/// pointer positions go through [`Viewport::device_to_canvas`] before anything
/// else looks at them.
#[derive(Debug, Clone)]
pub struct Viewport {
    matrix: Affine,
    pinch: Option<PinchState>,
    epsilon: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            matrix: Affine::IDENTITY,
            pinch: None,
            epsilon: PINCH_EPSILON,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with a custom jitter threshold.
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon,
            ..Self::default()
        }
    }

    /// Current canvas-to-device matrix.
    pub fn matrix(&self) -> Affine {
        self.matrix
    }

    /// The matrix as six coefficients `[a, b, c, d, e, f]`.
    pub fn coeffs(&self) -> [f64; 6] {
        self.matrix.as_coeffs()
    }

    /// Current zoom factor.
    pub fn scale(&self) -> f64 {
        self.matrix.as_coeffs()[0]
    }

    pub fn pinch(&self) -> Option<&PinchState> {
        self.pinch.as_ref()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }

    /// Convert a device point to canvas-local coordinates.
    pub fn device_to_canvas(&self, device: Point) -> Point {
        self.matrix.inverse() * device
    }

    /// Convert a canvas-local point to device coordinates.
    pub fn canvas_to_device(&self, canvas: Point) -> Point {
        self.matrix * canvas
    }

    /// Start a pinch from two device points.
    ///
    /// Returns false (and does nothing) when both fingers are at the same
    /// spot, since no ratio can be derived from a zero distance.
    pub fn begin_pinch(&mut self, a: Point, b: Point) -> bool {
        let initial_distance = a.distance(b);
        if initial_distance <= f64::EPSILON {
            log::debug!("Ignoring pinch with zero finger distance");
            return false;
        }

        let start_inverse = self.matrix.inverse();
        let center = start_inverse * a.midpoint(b);
        self.pinch = Some(PinchState {
            start_matrix: self.matrix,
            start_inverse,
            center,
            initial_distance,
            last_ratio: 1.0,
        });
        log::debug!("Pinch started at canvas {:?}", center);
        true
    }

    /// Update the pinch with the current finger positions.
    ///
    /// Returns true when the matrix changed.
    pub fn update_pinch(&mut self, a: Point, b: Point) -> bool {
        let Some(pinch) = self.pinch.as_mut() else {
            return false;
        };

        let ratio = a.distance(b) / pinch.initial_distance;
        if !ratio.is_finite() || ratio <= 0.0 {
            return false;
        }
        if (ratio - pinch.last_ratio).abs() < self.epsilon {
            return false;
        }

        let c = pinch.center.to_vec2();
        self.matrix = pinch.start_matrix
            * Affine::translate(c)
            * Affine::scale(ratio)
            * Affine::translate(-c);
        pinch.last_ratio = ratio;
        true
    }

    /// Finish the pinch. The matrix stays exactly as last computed.
    pub fn end_pinch(&mut self) {
        if self.pinch.take().is_some() {
            log::debug!("Pinch ended with scale {:.3}", self.scale());
        }
    }

    /// Drop any pinch and go back to the identity transform.
    pub fn reset(&mut self) {
        self.matrix = Affine::IDENTITY;
        self.pinch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_identity() {
        let viewport = Viewport::new();
        assert_eq!(viewport.coeffs(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_point_eq(viewport.device_to_canvas(Point::new(12.0, 34.0)), Point::new(12.0, 34.0));
    }

    #[test]
    fn test_pinch_keeps_center_fixed() {
        let mut viewport = Viewport::new();
        let a = Point::new(100.0, 100.0);
        let b = Point::new(200.0, 100.0);
        assert!(viewport.begin_pinch(a, b));

        assert!(viewport.update_pinch(Point::new(50.0, 100.0), Point::new(250.0, 100.0)));
        assert!((viewport.scale() - 2.0).abs() < 1e-9);

        let mid = Point::new(150.0, 100.0);
        assert_point_eq(viewport.canvas_to_device(mid), mid);
        assert_point_eq(viewport.device_to_canvas(Point::new(250.0, 100.0)), Point::new(200.0, 100.0));
    }

    #[test]
    fn test_pinch_composes_with_existing_matrix() {
        let mut viewport = Viewport::new();
        // Off-center zoom leaves both scale and translation in the matrix.
        assert!(viewport.begin_pinch(Point::new(250.0, 200.0), Point::new(350.0, 200.0)));
        assert!(viewport.update_pinch(Point::new(200.0, 200.0), Point::new(400.0, 200.0)));
        viewport.end_pinch();
        assert_eq!(viewport.coeffs(), [2.0, 0.0, 0.0, 2.0, -300.0, -200.0]);

        assert!(viewport.begin_pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        let center_device = Point::new(50.0, 0.0);
        let center_canvas = viewport.device_to_canvas(center_device);

        assert!(viewport.update_pinch(Point::new(-25.0, 0.0), Point::new(125.0, 0.0)));
        assert!((viewport.scale() - 3.0).abs() < 1e-9);
        assert_point_eq(viewport.canvas_to_device(center_canvas), center_device);
    }

    #[test]
    fn test_small_changes_ignored() {
        let mut viewport = Viewport::new();
        viewport.begin_pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        assert!(!viewport.update_pinch(Point::new(0.0, 0.0), Point::new(100.5, 0.0)));
        assert_eq!(viewport.matrix(), Affine::IDENTITY);
        assert!(viewport.update_pinch(Point::new(0.0, 0.0), Point::new(102.0, 0.0)));
    }

    #[test]
    fn test_end_keeps_matrix_unclamped() {
        let mut viewport = Viewport::new();
        viewport.begin_pinch(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        viewport.update_pinch(Point::new(0.0, 0.0), Point::new(5000.0, 0.0));
        let before = viewport.matrix();
        viewport.end_pinch();
        assert!(!viewport.is_pinching());
        assert_eq!(viewport.matrix(), before);
        assert!((viewport.scale() - 50.0).abs() < 1e-9);
        assert!(!viewport.update_pinch(Point::new(0.0, 0.0), Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_zero_distance_ignored() {
        let mut viewport = Viewport::new();
        let p = Point::new(10.0, 10.0);
        assert!(!viewport.begin_pinch(p, p));
        assert!(!viewport.is_pinching());
    }
}
