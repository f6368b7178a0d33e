//! Proximity graph of path segments.
//!
//! One [`ProximityNode`] per undirected adjacency of the [`Graph`](crate::graph::Graph), holding
//! its `[lon_a, lat_a, lon_b, lat_b]` quadruple. Two nodes are linked if their quadruples are
//! within `radius` of each other in 4-D, limited to the `k` nearest; links are stored on both
//! sides.
//!
//! The graph is an **arena**: nodes are addressed by index. Bundling merges a node into another
//! by marking it dead and recording where it went ([`ProximityNode::merged_into`]); references
//! are resolved through that chain until [`ProximityGraph::compact`] drops the dead nodes and
//! renumbers everything.
use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::warn;

use crate::constants::{LonLat, Quad};
use crate::graph::Graph;

pub type NodeId = usize;

type IndexedQuad = GeomWithData<Quad, NodeId>;

#[derive(Debug, Clone, PartialEq)]
pub struct ProximityNode {
    /// Directed segments carried by this node; more than one once bundled.
    pub segments: Vec<Quad>,
    pub neighbors: Vec<NodeId>,
    /// `(m1, m2)` of the bundle, if the node was produced by a merge.
    pub control_points: Option<(LonLat, LonLat)>,
    /// Group tag of the current bundling pass.
    pub group: Option<usize>,
    /// Set when this node was absorbed by another one.
    pub merged_into: Option<NodeId>,
}

impl ProximityNode {
    fn new(segment: Quad) -> Self {
        ProximityNode {
            segments: vec![segment],
            neighbors: Vec::new(),
            control_points: None,
            group: None,
            merged_into: None,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.merged_into.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ProximityGraph {
    nodes: Vec<ProximityNode>,
    index: RTree<IndexedQuad>,
}

impl Default for ProximityGraph {
    fn default() -> Self {
        ProximityGraph {
            nodes: Vec::new(),
            index: RTree::new(),
        }
    }
}

impl ProximityGraph {
    /// Build the proximity graph of the edges of `graph`.
    pub fn build(graph: &Graph, radius: f64, k: usize) -> Self {
        Self::from_segments(&graph.segments(), radius, k)
    }

    /// Build the proximity graph of a list of segments.
    ///
    /// Arguments
    /// -----------------
    /// * `segments`: one quadruple per node, in node order.
    /// * `radius`: maximal 4-D euclidean distance between linked quadruples (degrees).
    /// * `k`: maximal number of neighbors searched per node.
    pub fn from_segments(segments: &[Quad], radius: f64, k: usize) -> Self {
        let mut graph = ProximityGraph {
            nodes: segments.iter().copied().map(ProximityNode::new).collect(),
            index: RTree::new(),
        };
        graph.reindex();

        for id in 0..graph.nodes.len() {
            // the node itself is its own nearest entry
            for other in graph.nearest(&segments[id], k + 1, radius) {
                if other != id {
                    graph.link(id, other);
                }
            }
        }
        graph
    }

    fn reindex(&mut self) {
        let entries: Vec<IndexedQuad> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_alive())
            .flat_map(|(id, node)| {
                node.segments
                    .iter()
                    .map(move |quad| GeomWithData::new(*quad, id))
            })
            .collect();
        self.index = RTree::bulk_load(entries);
    }

    fn link(&mut self, a: NodeId, b: NodeId) {
        if !self.nodes[a].neighbors.contains(&b) {
            self.nodes[a].neighbors.push(b);
        }
        if !self.nodes[b].neighbors.contains(&a) {
            self.nodes[b].neighbors.push(a);
        }
    }

    /// Up to `k` distinct alive nodes carrying a segment within `radius` of `quad`, nearest first.
    pub fn nearest(&self, quad: &Quad, k: usize, radius: f64) -> Vec<NodeId> {
        let radius_2 = radius * radius;
        let mut found: Vec<NodeId> = Vec::with_capacity(k);
        for (entry, distance_2) in self.index.nearest_neighbor_iter_with_distance_2(quad) {
            if distance_2 > radius_2 || found.len() >= k {
                break;
            }
            if !found.contains(&entry.data) {
                found.push(entry.data);
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn alive_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_alive()).count()
    }

    pub fn node(&self, id: NodeId) -> Option<&ProximityNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> &[ProximityNode] {
        &self.nodes
    }

    /// Follow merges from `id` to the alive node that now carries its segments.
    ///
    /// Return
    /// ----------
    /// * `None` if `id` or a node on the chain does not exist.
    pub fn resolve(&self, mut id: NodeId) -> Option<NodeId> {
        // a chain is at most as long as the arena
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(id)?.merged_into {
                None => return Some(id),
                Some(next) => id = next,
            }
        }
        None
    }

    /// Alive neighbors of `id`, resolved and deduplicated. Unresolvable references are skipped.
    pub fn live_neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(node.neighbors.len());
        for &neighbor in &node.neighbors {
            match self.resolve(neighbor) {
                Some(alive) if alive != id && !out.contains(&alive) => out.push(alive),
                Some(_) => {}
                None => warn!(node = id, neighbor, "dangling proximity reference"),
            }
        }
        out
    }

    pub fn reset_groups(&mut self) {
        for node in &mut self.nodes {
            node.group = None;
        }
    }

    pub fn set_group(&mut self, id: NodeId, group: usize) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.group = Some(group);
        }
    }

    /// Merge `absorbed` into `target`.
    ///
    /// `target` receives the segments and neighbors of `absorbed` and the bundle control points;
    /// `absorbed` is marked dead and forwards to `target`.
    pub fn merge(&mut self, absorbed: NodeId, target: NodeId, control_points: (LonLat, LonLat)) {
        if absorbed == target || absorbed >= self.nodes.len() || target >= self.nodes.len() {
            return;
        }
        let moved = std::mem::take(&mut self.nodes[absorbed].segments);
        let moved_neighbors = std::mem::take(&mut self.nodes[absorbed].neighbors);
        self.nodes[absorbed].merged_into = Some(target);
        self.nodes[absorbed].control_points = None;

        let node = &mut self.nodes[target];
        node.segments.extend(moved);
        for neighbor in moved_neighbors {
            if neighbor != target && neighbor != absorbed && !node.neighbors.contains(&neighbor) {
                node.neighbors.push(neighbor);
            }
        }
        node.neighbors.retain(|&n| n != absorbed);
        node.control_points = Some(control_points);
    }

    /// Drop dead nodes and renumber the arena.
    ///
    /// Every neighbor reference is resolved to its alive node and remapped; self references,
    /// duplicates and dangling references are removed. The spatial index is rebuilt.
    pub fn compact(&mut self) {
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut next = 0;
        for (old, node) in self.nodes.iter().enumerate() {
            if node.is_alive() {
                remap[old] = Some(next);
                next += 1;
            }
        }

        let resolved: Vec<Vec<NodeId>> = (0..self.nodes.len())
            .map(|old| {
                if !self.nodes[old].is_alive() {
                    return Vec::new();
                }
                self.live_neighbors(old)
                    .into_iter()
                    .filter_map(|alive| remap[alive])
                    .collect()
            })
            .collect();

        let old_nodes = std::mem::take(&mut self.nodes);
        self.nodes = old_nodes
            .into_iter()
            .zip(resolved)
            .filter(|(node, _)| node.is_alive())
            .map(|(mut node, neighbors)| {
                node.neighbors = neighbors;
                node.group = None;
                node
            })
            .collect();
        self.reindex();
    }
}

#[cfg(test)]
mod proximity_test {
    use super::*;

    fn parallel(n: usize, gap: f64) -> Vec<Quad> {
        (0..n)
            .map(|i| {
                let y = i as f64 * gap;
                [0.0, y, 1.0, y]
            })
            .collect()
    }

    #[test]
    fn test_neighbors_within_radius() {
        let mut segments = parallel(3, 0.01);
        segments.push([50.0, 50.0, 51.0, 50.0]);
        let graph = ProximityGraph::from_segments(&segments, 0.05, 8);

        assert_eq!(graph.len(), 4);
        let mut first = graph.live_neighbors(0);
        first.sort_unstable();
        assert_eq!(first, vec![1, 2]);
        assert!(graph.live_neighbors(3).is_empty());
        // links are symmetric
        for id in 0..3 {
            for n in graph.live_neighbors(id) {
                assert!(graph.live_neighbors(n).contains(&id));
            }
        }
    }

    #[test]
    fn test_k_bounds_search() {
        let segments = parallel(6, 0.001);
        let graph = ProximityGraph::from_segments(&segments, 1.0, 2);
        assert_eq!(graph.nearest(&segments[0], 2, 1.0), vec![0, 1]);
        // the last node found two others by its own search, nothing linked to it from afar
        assert!(graph.live_neighbors(5).len() <= 3);
    }

    #[test]
    fn test_merge_and_compact() {
        let segments = parallel(3, 0.01);
        let mut graph = ProximityGraph::from_segments(&segments, 0.05, 8);

        graph.merge(0, 1, ([0.2, 0.005], [0.8, 0.005]));
        assert!(!graph.node(0).unwrap().is_alive());
        assert_eq!(graph.resolve(0), Some(1));
        assert_eq!(graph.live_neighbors(2), vec![1]);

        graph.compact();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node(0).unwrap().segments.len(), 2);
        assert_eq!(graph.node(0).unwrap().neighbors, vec![1]);
        assert_eq!(graph.node(1).unwrap().neighbors, vec![0]);
    }

    #[test]
    fn test_dangling_reference_is_pruned() {
        let mut graph = ProximityGraph::from_segments(&parallel(2, 0.01), 0.05, 8);
        graph.nodes[0].neighbors.push(99);
        assert_eq!(graph.live_neighbors(0), vec![1]);
        graph.compact();
        assert_eq!(graph.node(0).unwrap().neighbors, vec![1]);
    }
}
