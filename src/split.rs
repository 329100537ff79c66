//! Feature splitting: divide each river polyline into fixed-length segments.
//!
//! The segments produced here are the atomic edges of the corridor graph.
//! Segment order along the feature is preserved, and each segment keeps its
//! chainage (start/end measure along the source feature) so downstream
//! consumers can locate it without re-measuring geometry.

use crate::error::{Error, Result};
use crate::geo::{polyline_length, Point};
use crate::network::RiverFeature;
use serde::{Deserialize, Serialize};

/// Cut-point slop in meters. Keeps float residue from emitting zero-length
/// trailing segments or skipping a cut that lands exactly on a vertex.
const CUT_EPS: f64 = 1e-6;

/// One fixed-length sub-segment of a river feature (or the shorter trailing
/// remainder when the feature length is not an exact multiple).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSegment {
    /// Source feature this segment was cut from
    pub feature_id: i64,
    /// Measure along the source feature where this segment starts, meters
    pub start_m: f64,
    /// Measure along the source feature where this segment ends, meters
    pub end_m: f64,
    /// Segment length in meters
    pub length_m: f64,
    /// Segment geometry; original feature vertices between the cut points
    /// are preserved
    pub points: Vec<Point>,
}

/// Split a feature into segments of `split_length_m`, plus one trailing
/// remainder segment if the feature length is not an exact multiple.
///
/// Degenerate features (fewer than two points, zero or non-finite length)
/// are rejected with [`Error::DegenerateGeometry`]; the caller records the
/// error and moves on to the next feature.
pub fn split_feature(feature: &RiverFeature, split_length_m: f64) -> Result<Vec<SplitSegment>> {
    if feature.points.len() < 2 {
        return Err(Error::DegenerateGeometry {
            feature_id: feature.id,
            reason: format!("{} point(s), need at least 2", feature.points.len()),
        });
    }

    let total = polyline_length(&feature.points);
    if !total.is_finite() {
        return Err(Error::DegenerateGeometry {
            feature_id: feature.id,
            reason: "non-finite length".to_string(),
        });
    }
    if total <= CUT_EPS {
        return Err(Error::DegenerateGeometry {
            feature_id: feature.id,
            reason: "zero length".to_string(),
        });
    }

    let mut out = Vec::with_capacity((total / split_length_m) as usize + 1);
    let mut current: Vec<Point> = vec![feature.points[0]];
    let mut current_len = 0.0;
    let mut start_m = 0.0;

    for pair in feature.points.windows(2) {
        let mut a = pair[0];
        let b = pair[1];
        let mut remaining = a.distance(&b);

        // This vertex pair may carry several cut points.
        while current_len + remaining >= split_length_m - CUT_EPS {
            let needed = split_length_m - current_len;
            let t = if remaining > 0.0 {
                (needed / remaining).min(1.0)
            } else {
                0.0
            };
            let cut = Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
            current.push(cut);

            let end_m = start_m + split_length_m;
            out.push(SplitSegment {
                feature_id: feature.id,
                start_m,
                end_m,
                length_m: split_length_m,
                points: std::mem::replace(&mut current, vec![cut]),
            });

            start_m = end_m;
            current_len = 0.0;
            remaining -= needed;
            a = cut;
        }

        if remaining > 0.0 {
            current.push(b);
            current_len += remaining;
        }
    }

    // Trailing remainder
    if current_len > CUT_EPS && current.len() >= 2 {
        out.push(SplitSegment {
            feature_id: feature.id,
            start_m,
            end_m: start_m + current_len,
            length_m: current_len,
            points: current,
        });
    }

    Ok(out)
}
