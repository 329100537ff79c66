//! Riparian: exhaustive river-corridor search.
//!
//! Finds every contiguous stretch of a fixed target length through a
//! branching river network that carries a minimum amount of adjacent forest
//! cover. Features are split into fixed-length segments, segments become
//! edges of an undirected multigraph with snap-deduplicated endpoints,
//! forest cover is precomputed per edge, and a pruned depth-first search
//! from every node enumerates qualifying stretches, which are then
//! canonicalized and deduplicated.
//!
//! Reading geometry out of a geospatial source, computing the geometric
//! forest intersection itself, and exporting results are external
//! collaborators; see [`ForestCover`] for the one interface the core
//! consumes.

pub mod config;
pub mod cover;
pub mod dedup;
pub mod error;
pub mod geo;
pub mod graph;
pub mod network;
pub mod pipeline;
pub mod search;
pub mod split;

pub use config::CorridorConfig;
pub use cover::{annotate_cover, ChainageCover, CoverStats, ForestCover};
pub use dedup::dedupe_stretches;
pub use error::{Error, Result};
pub use geo::Point;
pub use graph::{BuildStats, Edge, EdgeId, GraphBuilder, Node, NodeId, RiverGraph};
pub use network::RiverFeature;
pub use pipeline::{find_corridors, CorridorReport};
pub use search::{enumerate_stretches, CancelToken, SearchOutcome, Stretch};
