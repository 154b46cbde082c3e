#![forbid(unsafe_code)]

//! Parent-to-child connector curves.

use mindmap_core::geometry::{Bounds, Point};

/// Cubic Bézier from a parent's right-middle to a child's left-middle.
///
/// Both control points sit halfway across horizontally, so the curve leaves
/// and enters its endpoints horizontally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCurve {
    pub start: Point,
    pub control1: Point,
    pub control2: Point,
    pub end: Point,
}

impl EdgeCurve {
    #[must_use]
    pub fn connect(start: Point, end: Point) -> Self {
        let mid = (end.x - start.x) / 2.0;
        Self {
            start,
            control1: Point::new(start.x + mid, start.y),
            control2: Point::new(end.x - mid, end.y),
            end,
        }
    }

    /// Point at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point {
        let t = t.clamp(0.0, 1.0);
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.start.x + b * self.control1.x + c * self.control2.x + d * self.end.x,
            a * self.start.y + b * self.control1.y + c * self.control2.y + d * self.end.y,
        )
    }

    /// `segments + 1` evenly spaced points for polyline rendering.
    #[must_use]
    pub fn flatten(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }

    /// Box containing the curve (the control polygon hull).
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let xs = [self.start.x, self.control1.x, self.control2.x, self.end.x];
        let ys = [self.start.y, self.control1.y, self.control2.y, self.end.y];
        Bounds::new(
            xs.iter().copied().fold(f64::INFINITY, f64::min),
            ys.iter().copied().fold(f64::INFINITY, f64::min),
            xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    }
}
