//! Analysis parameters.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters for one corridor analysis run.
///
/// Defaults match the habitat study this crate grew out of: 4 km corridors
/// with at least 1.9 km of adjacent forest, built from 100 m segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorridorConfig {
    /// Target corridor length in meters; a stretch qualifies once its
    /// accumulated length reaches or exceeds this
    pub target_length_m: f64,

    /// Minimum accumulated forest length in meters for a stretch to qualify
    pub min_forest_m: f64,

    /// Length of the atomic segments each feature is split into, in meters
    pub split_length_m: f64,

    /// Segment endpoints closer than this are merged into one graph node,
    /// in meters
    pub snap_tolerance_m: f64,

    /// When false (the default), a branch stops at the first point its
    /// length reaches the target and is measured there. When true,
    /// qualifying branches keep extending and every longer simple
    /// extension that still qualifies is emitted as well.
    pub extend_beyond_target: bool,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            target_length_m: 4000.0,
            min_forest_m: 1900.0,
            split_length_m: 100.0,
            snap_tolerance_m: 0.5,
            extend_beyond_target: false,
        }
    }
}

impl CorridorConfig {
    /// Reject configurations the run cannot start with.
    ///
    /// A forest threshold above the target length is allowed: every branch
    /// prunes immediately and the result is empty, which is a legitimate
    /// (if pointless) query. It is logged as a warning by the pipeline.
    pub fn validate(&self) -> Result<()> {
        if !(self.target_length_m > 0.0) || !self.target_length_m.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "target length must be positive, got {}",
                self.target_length_m
            )));
        }
        if !(self.split_length_m > 0.0) || !self.split_length_m.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "split length must be positive, got {}",
                self.split_length_m
            )));
        }
        if !(self.snap_tolerance_m > 0.0) || !self.snap_tolerance_m.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "snap tolerance must be positive, got {}",
                self.snap_tolerance_m
            )));
        }
        if self.snap_tolerance_m >= self.split_length_m {
            return Err(Error::InvalidConfig(format!(
                "snap tolerance {} must be smaller than the split length {}, \
                 otherwise every segment collapses onto a single node",
                self.snap_tolerance_m, self.split_length_m
            )));
        }
        if !(self.min_forest_m >= 0.0) || !self.min_forest_m.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "forest threshold must be non-negative, got {}",
                self.min_forest_m
            )));
        }
        Ok(())
    }
}
