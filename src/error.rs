//! Error types for corridor analysis.
//!
//! Per-feature and per-edge failures are recorded on the run report and never
//! abort the run; only `EmptyGraph` and `InvalidConfig` are fatal.

use serde::Serialize;
use thiserror::Error;

/// Convenience result type for riparian operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for riparian operations
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
pub enum Error {
    /// Input feature has no usable geometry (fewer than two points, or
    /// zero/non-finite length)
    #[error("degenerate geometry in feature {feature_id}: {reason}")]
    DegenerateGeometry { feature_id: i64, reason: String },

    /// A segment endpoint could not be resolved to a graph node; the whole
    /// feature is excluded from the graph
    #[error("unresolved endpoint in feature {feature_id}: {reason}")]
    UnresolvedEndpoint { feature_id: i64, reason: String },

    /// The forest-cover collaborator failed for an edge; the edge keeps a
    /// cover length of zero
    #[error("forest cover computation failed for edge {edge_id}: {reason}")]
    AttributeComputationFailed { edge_id: u32, reason: String },

    /// The deadline or cancellation token fired before every start node was
    /// searched; results collected so far are still returned
    #[error("search cancelled after {starts_completed} of {starts_total} start nodes")]
    SearchCancelled {
        starts_completed: usize,
        starts_total: usize,
    },

    /// Graph construction produced no nodes
    #[error("graph construction produced no nodes")]
    EmptyGraph,

    /// Configuration rejected before the run started
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
