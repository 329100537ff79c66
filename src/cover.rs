//! Forest-cover annotation.
//!
//! Measuring how much forest lies along an edge is geometric work that
//! belongs to an external collaborator; the core only needs the resulting
//! length. Cover is computed once per edge, cached on the edge table, and
//! never queried again during the search. Re-intersecting geometry inside
//! the traversal is the naive baseline this design exists to avoid.

use crate::error::{Error, Result};
use crate::graph::{Edge, RiverGraph};
use log::{debug, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// The geometric-intersection collaborator: given an edge, report the
/// length of forest cover along it in meters.
///
/// Implementations must be thread-safe; the precompute fans out over the
/// edge table. A returned error leaves the edge at zero cover and is
/// recorded on the run report, it never aborts the run.
pub trait ForestCover: Sync {
    fn forest_length_m(&self, edge: &Edge) -> Result<f64>;
}

/// Annotation counters.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CoverStats {
    /// Edges whose collaborator call failed (cover defaulted to zero)
    pub failures: Vec<Error>,
    /// Edges whose reported cover exceeded the edge length and was clamped
    pub clamped: usize,
}

/// Precompute forest cover for every edge in the graph.
///
/// Runs the collaborator in parallel over the edge table and caches the
/// result on each edge, clamped into `[0, length_m]`.
pub fn annotate_cover(graph: &mut RiverGraph, cover: &dyn ForestCover) -> CoverStats {
    let results: Vec<Result<f64>> = graph
        .edges()
        .par_iter()
        .map(|edge| cover.forest_length_m(edge))
        .collect();

    let mut stats = CoverStats::default();
    for (edge, result) in graph.edges_mut().iter_mut().zip(results) {
        match result {
            Ok(raw) => {
                let clamped = if raw.is_finite() { raw.clamp(0.0, edge.length_m) } else { 0.0 };
                if raw > edge.length_m || raw < 0.0 || !raw.is_finite() {
                    debug!(
                        "edge {}: cover {} outside [0, {}], clamped",
                        edge.id, raw, edge.length_m
                    );
                    stats.clamped += 1;
                }
                edge.forest_m = clamped;
            }
            Err(err) => {
                warn!("edge {}: cover lookup failed, defaulting to 0 ({err})", edge.id);
                edge.forest_m = 0.0;
                stats.failures.push(err);
            }
        }
    }
    stats
}

/// Forest cover expressed as intervals along each feature's chainage.
///
/// Useful when the forest dataset has already been linearly referenced onto
/// the river network upstream, and as the workhorse oracle for tests.
/// Overlapping input intervals are merged per feature, so fragmented forest
/// along an edge is summed without double counting.
#[derive(Debug, Default, Clone)]
pub struct ChainageCover {
    intervals: FxHashMap<i64, Vec<(f64, f64)>>,
}

impl ChainageCover {
    /// Build from `(feature_id, start_m, end_m)` triples.
    pub fn new(spans: impl IntoIterator<Item = (i64, f64, f64)>) -> Self {
        let mut intervals: FxHashMap<i64, Vec<(f64, f64)>> = FxHashMap::default();
        for (feature_id, start, end) in spans {
            if end > start {
                intervals.entry(feature_id).or_default().push((start, end));
            }
        }
        for spans in intervals.values_mut() {
            spans.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut merged: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
            for &(start, end) in spans.iter() {
                match merged.last_mut() {
                    Some(last) if start <= last.1 => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            *spans = merged;
        }
        Self { intervals }
    }
}

impl ForestCover for ChainageCover {
    fn forest_length_m(&self, edge: &Edge) -> Result<f64> {
        let Some(spans) = self.intervals.get(&edge.feature_id) else {
            return Ok(0.0);
        };
        let total = spans
            .iter()
            .map(|&(start, end)| (end.min(edge.end_m) - start.max(edge.start_m)).max(0.0))
            .sum();
        Ok(total)
    }
}
