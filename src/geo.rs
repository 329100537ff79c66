//! Planar geometry primitives.
//!
//! All coordinates are projected, metric units. The analysis runs on data
//! that has already been projected upstream, so there is no geodesic math
//! and no coordinate-system handling anywhere in this crate.

use serde::{Deserialize, Serialize};

/// A point in projected planar coordinates (meters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point in meters
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Total length of a polyline in meters
pub fn polyline_length(points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(&pair[1]))
        .sum()
}

/// Interpolate the point at `measure` meters along a polyline.
///
/// Measures past the end clamp to the last vertex. Returns `None` for an
/// empty polyline or a negative measure.
pub fn point_along(points: &[Point], measure: f64) -> Option<Point> {
    if points.is_empty() || measure < 0.0 {
        return None;
    }

    let mut remaining = measure;
    for pair in points.windows(2) {
        let seg_len = pair[0].distance(&pair[1]);
        if remaining <= seg_len {
            if seg_len == 0.0 {
                return Some(pair[0]);
            }
            let t = remaining / seg_len;
            return Some(Point::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            ));
        }
        remaining -= seg_len;
    }

    points.last().copied()
}
