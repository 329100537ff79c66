//! Corridor graph construction.
//!
//! Split segments become edges of an undirected multigraph; their endpoints
//! are deduplicated into nodes by snapping coordinates within a tolerance.
//! The builder owns a mutable R-tree snap index during construction; the
//! finished [`RiverGraph`] is immutable and is shared read-only by the
//! search phase.

use crate::error::Error;
use crate::geo::Point;
use crate::split::SplitSegment;
use log::debug;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

pub type NodeId = u32;
pub type EdgeId = u32;

/// A junction or endpoint in the river network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Canonical position: the first segment endpoint that claimed this
    /// snap cell defines it; later endpoints within tolerance attach here
    pub position: Point,
    /// Edges incident to this node, in registration order
    pub incident: Vec<EdgeId>,
}

/// One atomic river segment between two nodes.
///
/// The graph is undirected; `a`/`b` record registration order only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub a: NodeId,
    pub b: NodeId,
    /// Physical length in meters
    pub length_m: f64,
    /// Precomputed forest cover along this edge, meters. Zero until
    /// annotated; never exceeds `length_m`
    pub forest_m: f64,
    /// Source feature this edge was cut from
    pub feature_id: i64,
    /// Chainage of this edge along the source feature, meters
    pub start_m: f64,
    pub end_m: f64,
    /// Edge geometry in projected coordinates
    pub points: Vec<Point>,
}

impl Edge {
    /// The endpoint opposite `node`.
    pub fn opposite(&self, node: NodeId) -> NodeId {
        if node == self.a {
            self.b
        } else {
            self.a
        }
    }
}

/// The frozen corridor graph: node and edge tables.
#[derive(Debug, Serialize, Deserialize)]
pub struct RiverGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl RiverGraph {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [Edge] {
        &mut self.edges
    }
}

/// Point in the snap index, tagged with the node it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SnapVertex {
    coords: [f64; 2],
    node: NodeId,
}

impl RTreeObject for SnapVertex {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords)
    }
}

impl PointDistance for SnapVertex {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.coords[0] - point[0];
        let dy = self.coords[1] - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.coords == *point
    }
}

/// Construction counters, reported alongside the final result.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BuildStats {
    pub features_seen: usize,
    pub features_skipped: usize,
    /// Segments whose endpoints snapped to the same node (shorter than the
    /// snap tolerance); dropped, since a self-loop can never sit on a
    /// simple path
    pub segments_collapsed: usize,
    /// Per-feature errors recorded during the build
    pub errors: Vec<Error>,
}

/// Builds a [`RiverGraph`] from split segments.
///
/// The snap index is a build-phase-only structure: it is dropped when
/// [`GraphBuilder::finish`] freezes the graph, so nothing mutable survives
/// into the search phase.
pub struct GraphBuilder {
    snap_tolerance_m: f64,
    index: RTree<SnapVertex>,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    stats: BuildStats,
}

impl GraphBuilder {
    pub fn new(snap_tolerance_m: f64) -> Self {
        Self {
            snap_tolerance_m,
            index: RTree::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Register all segments of one feature.
    ///
    /// The feature is validated as a whole first: if any segment endpoint
    /// cannot be resolved (non-finite coordinates, missing geometry), the
    /// entire feature is excluded and an [`Error::UnresolvedEndpoint`] is
    /// recorded. This keeps a malformed feature from contributing a partial
    /// chain of edges.
    pub fn add_feature_segments(&mut self, feature_id: i64, segments: &[SplitSegment]) {
        self.stats.features_seen += 1;

        for seg in segments {
            let resolvable = seg.points.len() >= 2
                && seg.points.first().is_some_and(|p| p.is_finite())
                && seg.points.last().is_some_and(|p| p.is_finite());
            if !resolvable {
                debug!(
                    "feature {}: endpoint at chainage {:.1} not resolvable, skipping feature",
                    feature_id, seg.start_m
                );
                self.stats.features_skipped += 1;
                self.stats.errors.push(Error::UnresolvedEndpoint {
                    feature_id,
                    reason: format!("segment at chainage {:.1} m has no usable endpoints", seg.start_m),
                });
                return;
            }
        }

        for seg in segments {
            let head = self.resolve(*seg.points.first().unwrap());
            let tail = self.resolve(*seg.points.last().unwrap());

            if head == tail {
                self.stats.segments_collapsed += 1;
                continue;
            }

            let id = self.edges.len() as EdgeId;
            self.edges.push(Edge {
                id,
                a: head,
                b: tail,
                length_m: seg.length_m,
                forest_m: 0.0,
                feature_id,
                start_m: seg.start_m,
                end_m: seg.end_m,
                points: seg.points.clone(),
            });
            self.nodes[head as usize].incident.push(id);
            self.nodes[tail as usize].incident.push(id);
        }
    }

    /// Resolve a coordinate to an existing node within the snap tolerance,
    /// or create a new one. First-seen-wins: the earliest endpoint to claim
    /// a location defines the node's canonical position.
    fn resolve(&mut self, position: Point) -> NodeId {
        let query = [position.x, position.y];
        let tol2 = self.snap_tolerance_m * self.snap_tolerance_m;

        if let Some(hit) = self.index.nearest_neighbor(&query) {
            if hit.distance_2(&query) <= tol2 {
                return hit.node;
            }
        }

        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node {
            id,
            position,
            incident: Vec::new(),
        });
        self.index.insert(SnapVertex { coords: query, node: id });
        id
    }

    /// Freeze the graph. The snap index is dropped here; the returned
    /// tables are immutable.
    pub fn finish(self) -> (RiverGraph, BuildStats) {
        (
            RiverGraph {
                nodes: self.nodes,
                edges: self.edges,
            },
            self.stats,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RiverFeature;
    use crate::split::split_feature;

    fn segments_for(feature: &RiverFeature) -> Vec<SplitSegment> {
        split_feature(feature, 100.0).unwrap()
    }

    #[test]
    fn test_chain_topology() {
        let feature = RiverFeature::new(1, vec![Point::new(0.0, 0.0), Point::new(400.0, 0.0)]);
        let mut builder = GraphBuilder::new(0.5);
        builder.add_feature_segments(1, &segments_for(&feature));
        let (graph, stats) = builder.finish();

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        assert!(stats.errors.is_empty());

        // Interior nodes have two incident edges, endpoints one.
        let degrees: Vec<usize> = graph.nodes().iter().map(|n| n.incident.len()).collect();
        assert_eq!(degrees.iter().filter(|&&d| d == 1).count(), 2);
        assert_eq!(degrees.iter().filter(|&&d| d == 2).count(), 3);
    }

    #[test]
    fn test_endpoints_snap_across_features() {
        // Second feature starts within tolerance of the first one's tail.
        let f1 = RiverFeature::new(1, vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)]);
        let f2 = RiverFeature::new(2, vec![Point::new(200.3, 0.0), Point::new(400.0, 0.0)]);

        let mut builder = GraphBuilder::new(0.5);
        builder.add_feature_segments(1, &segments_for(&f1));
        builder.add_feature_segments(2, &segments_for(&f2));
        let (graph, _) = builder.finish();

        // Shared junction: 3 + 3 nodes minus the merged one.
        assert_eq!(graph.node_count(), 5);
        let junction = graph
            .nodes()
            .iter()
            .find(|n| n.incident.len() == 2 && n.position.distance(&Point::new(200.0, 0.0)) < 0.5)
            .expect("junction node");
        // First-seen-wins: canonical position comes from feature 1.
        assert_eq!(junction.position, Point::new(200.0, 0.0));
    }

    #[test]
    fn test_referential_integrity() {
        let f1 = RiverFeature::new(1, vec![Point::new(0.0, 0.0), Point::new(300.0, 0.0)]);
        let f2 = RiverFeature::new(2, vec![Point::new(100.0, 0.0), Point::new(100.0, 250.0)]);

        let mut builder = GraphBuilder::new(0.5);
        builder.add_feature_segments(1, &segments_for(&f1));
        builder.add_feature_segments(2, &segments_for(&f2));
        let (graph, _) = builder.finish();

        for edge in graph.edges() {
            assert!((edge.a as usize) < graph.node_count());
            assert!((edge.b as usize) < graph.node_count());
            assert!(graph.node(edge.a).incident.contains(&edge.id));
            assert!(graph.node(edge.b).incident.contains(&edge.id));
        }
        for node in graph.nodes() {
            for &eid in &node.incident {
                let edge = graph.edge(eid);
                assert!(edge.a == node.id || edge.b == node.id);
            }
        }
    }

    #[test]
    fn test_branch_junction_degree() {
        // Three chains radiating from the origin.
        let arms = [
            Point::new(300.0, 0.0),
            Point::new(0.0, 300.0),
            Point::new(-300.0, 0.0),
        ];
        let mut builder = GraphBuilder::new(0.5);
        for (i, tip) in arms.iter().enumerate() {
            let f = RiverFeature::new(i as i64, vec![Point::new(0.0, 0.0), *tip]);
            builder.add_feature_segments(i as i64, &segments_for(&f));
        }
        let (graph, _) = builder.finish();

        let hub = graph
            .nodes()
            .iter()
            .find(|n| n.position.distance(&Point::new(0.0, 0.0)) < 0.5)
            .expect("hub node");
        assert_eq!(hub.incident.len(), 3);
    }

    #[test]
    fn test_unresolvable_feature_is_excluded_whole() {
        let good = RiverFeature::new(1, vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)]);
        let mut bad_segments = segments_for(&good);
        bad_segments[1].points.last_mut().unwrap().x = f64::NAN;

        let mut builder = GraphBuilder::new(0.5);
        builder.add_feature_segments(9, &bad_segments);
        let (graph, stats) = builder.finish();

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.features_skipped, 1);
        assert!(matches!(
            stats.errors[0],
            Error::UnresolvedEndpoint { feature_id: 9, .. }
        ));
    }

    #[test]
    fn test_sub_tolerance_segment_collapses() {
        let seg = SplitSegment {
            feature_id: 1,
            start_m: 0.0,
            end_m: 0.2,
            length_m: 0.2,
            points: vec![Point::new(0.0, 0.0), Point::new(0.2, 0.0)],
        };
        let mut builder = GraphBuilder::new(0.5);
        builder.add_feature_segments(1, &[seg]);
        let (graph, stats) = builder.finish();

        assert_eq!(graph.edge_count(), 0);
        assert_eq!(stats.segments_collapsed, 1);
    }
}
