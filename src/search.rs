//! Exhaustive corridor search.
//!
//! A depth-first traversal starts from every node in the graph: corridors
//! are not anchored to feature boundaries, so any junction or endpoint is a
//! valid starting point. Each branch owns its path state exclusively and
//! mutates it in place under a strict push/pop discipline, with no
//! per-step copying. The graph itself is frozen before the search begins, so start
//! nodes fan out across a rayon worker pool with no locking beyond the
//! result collector.
//!
//! A branch dies in one of three ways: it reaches the target length (and is
//! measured against the forest threshold exactly there), it provably cannot
//! reach the threshold within its remaining length budget, or it runs out
//! of unvisited neighbors.

use crate::config::CorridorConfig;
use crate::graph::{EdgeId, NodeId, RiverGraph};
use log::{debug, info};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

/// How many branch expansions pass between cancellation polls.
const CANCEL_CHECK_INTERVAL: u32 = 1024;

/// Cooperative cancellation: an explicit flag, an optional deadline, or both.
///
/// Workers poll the token between branch expansions; on cancellation the
/// search returns whatever it has collected so far, flagged incomplete.
#[derive(Debug, Default)]
pub struct CancelToken {
    flag: AtomicBool,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            flag: AtomicBool::new(false),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

/// A simple path that reached the target length with enough forest cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stretch {
    /// Ordered edge sequence (traversal order as found; direction-normalized
    /// by the deduplicator)
    pub edges: Vec<EdgeId>,
    /// Accumulated physical length in meters
    pub length_m: f64,
    /// Accumulated forest cover in meters
    pub forest_m: f64,
}

impl Stretch {
    /// Share of the stretch running through forest, in `[0, 1]`.
    pub fn forest_fraction(&self) -> f64 {
        if self.length_m > 0.0 {
            self.forest_m / self.length_m
        } else {
            0.0
        }
    }
}

/// Raw search result, before deduplication.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Every qualifying path found, including reversed and restarted
    /// discoveries of the same physical stretch
    pub stretches: Vec<Stretch>,
    /// True when the token or deadline fired before all start nodes ran
    pub cancelled: bool,
    pub starts_completed: usize,
    pub starts_total: usize,
    /// Paths that reached the target length and were measured against the
    /// forest threshold (qualifying or not)
    pub candidates_seen: usize,
}

struct Walker<'a> {
    graph: &'a RiverGraph,
    target_m: f64,
    threshold_m: f64,
    /// Longest edge in the graph; see the pruning bound in `explore`
    max_edge_m: f64,
    extend: bool,
    cancel: Option<&'a CancelToken>,
    visited: &'a mut [bool],
    path: &'a mut Vec<EdgeId>,
    out: &'a mut Vec<Stretch>,
    candidates: usize,
    steps: u32,
    aborted: bool,
}

impl Walker<'_> {
    fn explore(&mut self, node: NodeId, length_m: f64, forest_m: f64) {
        if self.aborted {
            return;
        }
        self.steps = self.steps.wrapping_add(1);
        if self.steps % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(token) = self.cancel {
                if token.is_cancelled() {
                    self.aborted = true;
                    return;
                }
            }
        }

        // Cover never exceeds physical length on any edge, so the length
        // still walkable before measurement bounds the forest still
        // attainable. Measurement happens on the first edge push that
        // reaches the target, which can overshoot it by at most one edge.
        // The bound must include that slack or it discards branches whose
        // final, overshooting edge carries the deciding forest.
        //
        // The bound fixes the measurement point near the target length, so
        // it only holds under the stop-at-target policy.
        if !self.extend
            && forest_m + (self.target_m - length_m) + self.max_edge_m < self.threshold_m
        {
            return;
        }

        let graph = self.graph;
        for &eid in &graph.node(node).incident {
            let edge = graph.edge(eid);
            let far = edge.opposite(node);
            if self.visited[far as usize] {
                continue;
            }

            let new_length = length_m + edge.length_m;
            let new_forest = forest_m + edge.forest_m;
            self.path.push(eid);

            if new_length >= self.target_m {
                // Measurement point: the first step that meets the length
                // target. Under the default policy the branch ends here
                // whether or not it qualifies: growing an unqualified
                // overshoot only changes which stretch is being measured.
                self.candidates += 1;
                if new_forest >= self.threshold_m {
                    self.out.push(Stretch {
                        edges: self.path.clone(),
                        length_m: new_length,
                        forest_m: new_forest,
                    });
                }
                if self.extend {
                    self.visited[far as usize] = true;
                    self.explore(far, new_length, new_forest);
                    self.visited[far as usize] = false;
                }
            } else {
                self.visited[far as usize] = true;
                self.explore(far, new_length, new_forest);
                self.visited[far as usize] = false;
            }

            self.path.pop();
            if self.aborted {
                // State is restored frame by frame on the way out, so the
                // scratch buffers stay reusable for the next start node.
                return;
            }
        }
    }
}

/// Run the search from every node of the graph.
///
/// The graph must already carry forest annotations. Emission order across
/// start nodes is unspecified; the deduplicator does not depend on it.
pub fn enumerate_stretches(
    graph: &RiverGraph,
    config: &CorridorConfig,
    cancel: Option<&CancelToken>,
) -> SearchOutcome {
    let n = graph.node_count();
    let max_edge_m = graph
        .edges()
        .iter()
        .map(|e| e.length_m)
        .fold(0.0, f64::max);
    let collector: Mutex<Vec<Stretch>> = Mutex::new(Vec::new());
    let candidates = AtomicUsize::new(0);
    let completed = AtomicUsize::new(0);
    let cancelled = AtomicBool::new(false);

    info!("searching corridors from {} start nodes", n);
    let started = Instant::now();

    (0..n as u32).into_par_iter().for_each_init(
        || (vec![false; n], Vec::<EdgeId>::with_capacity(64)),
        |(visited, path), start| {
            if cancelled.load(Ordering::Relaxed)
                || cancel.is_some_and(|t| t.is_cancelled())
            {
                cancelled.store(true, Ordering::Relaxed);
                return;
            }

            let mut local = Vec::new();
            let mut walker = Walker {
                graph,
                target_m: config.target_length_m,
                threshold_m: config.min_forest_m,
                max_edge_m,
                extend: config.extend_beyond_target,
                cancel,
                visited,
                path,
                out: &mut local,
                candidates: 0,
                steps: 0,
                aborted: false,
            };

            walker.visited[start as usize] = true;
            walker.explore(start, 0.0, 0.0);
            walker.visited[start as usize] = false;

            let walker_candidates = walker.candidates;
            if walker.aborted {
                cancelled.store(true, Ordering::Relaxed);
            } else {
                completed.fetch_add(1, Ordering::Relaxed);
            }
            candidates.fetch_add(walker_candidates, Ordering::Relaxed);

            // Batched push: one short critical section per start node.
            if !local.is_empty() {
                collector.lock().append(&mut local);
            }
        },
    );

    let stretches = collector.into_inner();
    let outcome = SearchOutcome {
        cancelled: cancelled.load(Ordering::Relaxed),
        starts_completed: completed.load(Ordering::Relaxed),
        starts_total: n,
        candidates_seen: candidates.load(Ordering::Relaxed),
        stretches,
    };
    debug!(
        "search done in {:.2}s: {} raw stretches, {} candidates, cancelled={}",
        started.elapsed().as_secs_f64(),
        outcome.stretches.len(),
        outcome.candidates_seen,
        outcome.cancelled
    );
    outcome
}
