//! Input data model for the river network.
//!
//! Reading features out of a geospatial source is an external concern; the
//! core consumes plain polylines that have already been projected.

use crate::geo::{polyline_length, Point};
use serde::{Deserialize, Serialize};

/// One linear network feature: an ordered polyline in projected coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiverFeature {
    pub id: i64,
    pub points: Vec<Point>,
}

impl RiverFeature {
    pub fn new(id: i64, points: Vec<Point>) -> Self {
        Self { id, points }
    }

    /// Total feature length in meters
    pub fn length_m(&self) -> f64 {
        polyline_length(&self.points)
    }
}
