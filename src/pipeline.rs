//! End-to-end corridor analysis.
//!
//! Wires the stages together: split features into segments, build the
//! graph, precompute forest cover, search, deduplicate. Per-feature and
//! per-edge failures are collected on the report; only an empty graph or a
//! rejected configuration aborts the run.

use crate::config::CorridorConfig;
use crate::cover::{annotate_cover, ForestCover};
use crate::dedup::dedupe_stretches;
use crate::error::{Error, Result};
use crate::graph::GraphBuilder;
use crate::network::RiverFeature;
use crate::search::{enumerate_stretches, CancelToken, Stretch};
use crate::split::split_feature;
use log::{info, warn};
use serde::Serialize;

/// Final result of one analysis run.
///
/// The deduplicated qualifying set plus everything the caller needs to
/// judge how the run went: graph size, which inputs were excluded and why,
/// and whether the search ran to completion.
#[derive(Debug, Serialize)]
pub struct CorridorReport {
    /// Deduplicated qualifying stretches, canonically ordered
    pub stretches: Vec<Stretch>,

    pub node_count: usize,
    pub edge_count: usize,
    pub features_in: usize,
    pub features_skipped: usize,
    /// Segments dropped because both endpoints snapped to one node
    pub segments_collapsed: usize,

    /// Why each excluded feature was skipped
    pub skipped: Vec<Error>,
    /// Cover lookups that failed (those edges count zero forest)
    pub cover_failures: Vec<Error>,
    /// Cover values outside `[0, edge length]`, clamped
    pub cover_clamped: usize,

    /// Present when the search was cancelled before finishing; the
    /// stretches above are the partial set collected up to that point
    pub cancellation: Option<Error>,
    pub starts_completed: usize,
    pub starts_total: usize,

    /// Paths that reached the target length and were measured (before
    /// deduplication, qualifying or not)
    pub candidates_seen: usize,
    /// Qualifying emissions before deduplication
    pub raw_stretch_count: usize,
}

impl CorridorReport {
    /// True when the search was cancelled before covering every start node.
    pub fn incomplete(&self) -> bool {
        self.cancellation.is_some()
    }

    /// Share of measured candidates that met the forest threshold.
    pub fn success_rate(&self) -> f64 {
        if self.candidates_seen == 0 {
            0.0
        } else {
            self.raw_stretch_count as f64 / self.candidates_seen as f64
        }
    }

    /// One-line run summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} qualifying stretches ({} raw, {} candidates, {:.1}% suitable); \
             graph {} nodes / {} edges; {} of {} features skipped; \
             {} cover failures{}",
            self.stretches.len(),
            self.raw_stretch_count,
            self.candidates_seen,
            self.success_rate() * 100.0,
            self.node_count,
            self.edge_count,
            self.features_skipped,
            self.features_in,
            self.cover_failures.len(),
            if self.incomplete() { "; INCOMPLETE" } else { "" },
        )
    }
}

/// Run the full analysis over a set of river features.
///
/// `cover` is the external geometric-intersection collaborator; it is
/// consulted once per edge before the search starts and never during it.
pub fn find_corridors(
    features: &[RiverFeature],
    cover: &dyn ForestCover,
    config: &CorridorConfig,
    cancel: Option<&CancelToken>,
) -> Result<CorridorReport> {
    config.validate()?;
    if config.min_forest_m > config.target_length_m {
        warn!(
            "forest threshold {} exceeds target length {}: no stretch can qualify",
            config.min_forest_m, config.target_length_m
        );
    }

    let mut skipped = Vec::new();
    let mut builder = GraphBuilder::new(config.snap_tolerance_m);
    for feature in features {
        match split_feature(feature, config.split_length_m) {
            Ok(segments) => builder.add_feature_segments(feature.id, &segments),
            Err(err) => {
                warn!("skipping feature: {err}");
                skipped.push(err);
            }
        }
    }

    let (mut graph, build_stats) = builder.finish();
    skipped.extend(build_stats.errors);
    info!(
        "graph built: {} nodes, {} edges ({} features in, {} skipped, {} segments collapsed)",
        graph.node_count(),
        graph.edge_count(),
        features.len(),
        skipped.len(),
        build_stats.segments_collapsed
    );

    if graph.node_count() == 0 {
        return Err(Error::EmptyGraph);
    }

    let cover_stats = annotate_cover(&mut graph, cover);
    info!(
        "cover annotated: {} failures, {} clamped",
        cover_stats.failures.len(),
        cover_stats.clamped
    );

    let outcome = enumerate_stretches(&graph, config, cancel);
    let raw_stretch_count = outcome.stretches.len();
    let stretches = dedupe_stretches(outcome.stretches);

    let cancellation = outcome.cancelled.then(|| Error::SearchCancelled {
        starts_completed: outcome.starts_completed,
        starts_total: outcome.starts_total,
    });

    let report = CorridorReport {
        stretches,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        features_in: features.len(),
        features_skipped: skipped.len(),
        segments_collapsed: build_stats.segments_collapsed,
        skipped,
        cover_failures: cover_stats.failures,
        cover_clamped: cover_stats.clamped,
        cancellation,
        starts_completed: outcome.starts_completed,
        starts_total: outcome.starts_total,
        candidates_seen: outcome.candidates_seen,
        raw_stretch_count,
    };
    info!("{}", report.summary());
    Ok(report)
}
