//! Stretch deduplication.
//!
//! The search discovers every qualifying stretch at least twice (once from
//! each end), and emission order across parallel start nodes is arbitrary.
//! Canonicalizing the edge sequence to a direction-independent form makes
//! identity a pure function of the edges themselves, independent of where
//! the search started.

use crate::graph::EdgeId;
use crate::search::Stretch;
use rustc_hash::FxHashSet;

/// Direction-independent form of an edge sequence: the lexicographically
/// smaller of the forward and reversed orders.
pub fn canonical_edges(edges: &[EdgeId]) -> Vec<EdgeId> {
    let forward = edges.to_vec();
    let mut reversed = forward.clone();
    reversed.reverse();
    if forward <= reversed {
        forward
    } else {
        reversed
    }
}

/// Collapse duplicate discoveries of the same physical stretch.
///
/// Keeps the first occurrence of each canonical form, rewrites the kept
/// stretch to its canonical edge order, and sorts the result so identical
/// inputs produce identical reports regardless of worker scheduling.
pub fn dedupe_stretches(stretches: Vec<Stretch>) -> Vec<Stretch> {
    let mut seen: FxHashSet<Vec<EdgeId>> = FxHashSet::default();
    seen.reserve(stretches.len());

    let mut out = Vec::new();
    for stretch in stretches {
        let canonical = canonical_edges(&stretch.edges);
        if seen.insert(canonical.clone()) {
            out.push(Stretch {
                edges: canonical,
                ..stretch
            });
        }
    }

    out.sort_by(|a, b| a.edges.cmp(&b.edges));
    out
}
