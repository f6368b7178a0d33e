//! # Graph: spatial vertex/adjacency graph of simplified trajectories
//!
//! Vertices are positions, edges are undirected adjacencies stored symmetrically on both
//! endpoints. The bundler reads the graph as a list of segments (one per adjacency) through
//! [`Graph::segments`].
//!
//! Modules
//! -----------------
//! * [`proximity`](crate::graph::proximity) – the proximity graph the bundler works on.
use std::collections::HashMap;

use ahash::RandomState;
use tracing::debug;

use crate::atlas_errors::AtlasError;
use crate::constants::{LonLat, Quad};
use crate::trajectories::Trajectory;

pub mod proximity;

/// Stable vertex identifier. Ids are never reused within one graph.
pub type VertexId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: LonLat,
    /// Adjacent vertex ids, no duplicates.
    pub adjacent: Vec<VertexId>,
}

/// Undirected graph keyed by [`VertexId`].
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: HashMap<VertexId, Vertex, RandomState>,
    next_id: VertexId,
}

/// Bit pattern of a position, so equal positions share a vertex.
fn position_key(p: LonLat) -> (u64, u64) {
    (p[0].to_bits(), p[1].to_bits())
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph where consecutive waypoints of every trajectory are adjacent.
    ///
    /// Identical positions, within or across trajectories, share one vertex; a segment between
    /// two identical positions adds no edge.
    pub fn from_trajectories<'a>(trajectories: impl IntoIterator<Item = &'a Trajectory>) -> Self {
        let mut graph = Graph::new();
        let mut by_position: HashMap<(u64, u64), VertexId, RandomState> = HashMap::default();

        for trajectory in trajectories {
            let mut previous: Option<VertexId> = None;
            for waypoint in &trajectory.waypoints {
                let id = *by_position
                    .entry(position_key(waypoint.position))
                    .or_insert_with(|| graph.add_vertex(waypoint.position));
                if let Some(prev) = previous {
                    if prev != id {
                        // both ids were just created, cannot fail
                        let _ = graph.add_edge(prev, id);
                    }
                }
                previous = Some(id);
            }
        }
        debug!(
            vertices = graph.len(),
            edges = graph.edge_count(),
            "graph built from trajectories"
        );
        graph
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.vertices.values().map(|v| v.adjacent.len()).sum::<usize>() / 2
    }

    pub fn add_vertex(&mut self, position: LonLat) -> VertexId {
        let id = self.next_id;
        self.next_id += 1;
        self.vertices.insert(
            id,
            Vertex {
                position,
                adjacent: Vec::new(),
            },
        );
        id
    }

    pub fn find(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    pub fn update_position(&mut self, id: VertexId, position: LonLat) -> Result<(), AtlasError> {
        self.vertices
            .get_mut(&id)
            .ok_or(AtlasError::VertexNotFound(id))?
            .position = position;
        Ok(())
    }

    /// Link `a` and `b` on both sides. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> Result<(), AtlasError> {
        for id in [a, b] {
            if !self.vertices.contains_key(&id) {
                return Err(AtlasError::VertexNotFound(id));
            }
        }
        if a == b {
            return Ok(());
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(vertex) = self.vertices.get_mut(&from) {
                if !vertex.adjacent.contains(&to) {
                    vertex.adjacent.push(to);
                }
            }
        }
        Ok(())
    }

    /// Unlink `a` and `b` on both sides. Removing a missing edge is a no-op.
    pub fn remove_edge(&mut self, a: VertexId, b: VertexId) -> Result<(), AtlasError> {
        for id in [a, b] {
            if !self.vertices.contains_key(&id) {
                return Err(AtlasError::VertexNotFound(id));
            }
        }
        for (from, to) in [(a, b), (b, a)] {
            if let Some(vertex) = self.vertices.get_mut(&from) {
                vertex.adjacent.retain(|&v| v != to);
            }
        }
        Ok(())
    }

    /// Remove a vertex together with its incident edges.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<Vertex, AtlasError> {
        let vertex = self
            .vertices
            .remove(&id)
            .ok_or(AtlasError::VertexNotFound(id))?;
        for other in &vertex.adjacent {
            if let Some(neighbor) = self.vertices.get_mut(other) {
                neighbor.adjacent.retain(|&v| v != id);
            }
        }
        Ok(vertex)
    }

    /// Every undirected edge once, as `(smaller id, larger id)`, sorted.
    pub fn edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut edges: Vec<(VertexId, VertexId)> = self
            .vertices
            .iter()
            .flat_map(|(&id, v)| v.adjacent.iter().map(move |&other| (id, other)))
            .filter(|(a, b)| a < b)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Every undirected edge once as a `[lon_a, lat_a, lon_b, lat_b]` quadruple, from the
    /// smaller to the larger vertex id.
    pub fn segments(&self) -> Vec<Quad> {
        self.edges()
            .into_iter()
            .filter_map(|(a, b)| {
                let (pa, pb) = (self.find(a)?.position, self.find(b)?.position);
                Some([pa[0], pa[1], pb[0], pb[1]])
            })
            .collect()
    }
}
