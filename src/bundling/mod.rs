//! # Bundling: ink-minimizing edge bundling
//!
//! The [`EdgeBundler`] repeatedly merges close segments of a
//! [`ProximityGraph`](crate::graph::proximity::ProximityGraph) when drawing them as one bundle
//! uses less ink than drawing them apart.
//!
//! One pass
//! -----------------
//! 1. Reset the group tags.
//! 2. For each alive, ungrouped node, evaluate the bundle it would form with each of its live
//!    neighbors; the gain is `node_ink(a) + node_ink(b) − best_bundle(a ∪ b).ink`.
//! 3. If the best gain is positive, merge the node into that neighbor (which keeps the new
//!    control points) and tag both with the neighbor's group, or a fresh one. Otherwise the node
//!    gets a group of its own.
//! 4. Coalesce: compact the arena so each group is a single node again.
//!
//! Passes repeat until one saves nothing, the pass budget is exhausted or the caller cancels.
//! Each merge lowers the total ink by exactly its gain, so a run never increases the ink and
//! always terminates (every merge removes a node).
//!
//! Modules
//! -----------------
//! * [`golden_section`](crate::bundling::golden_section) – the 1-D minimizer.
//! * [`ink`](crate::bundling::ink) – centroids, bundled ink, control point search.
use serde::Serialize;
use tracing::{debug, info};

use crate::atlas_errors::AtlasError;
use crate::constants::{LonLat, Meter, EPS};
use crate::graph::proximity::{NodeId, ProximityGraph};
use crate::params::AtlasParams;

pub mod golden_section;
pub mod ink;

use ink::{best_bundle, node_ink};

/// One straight line of the rendered bundle drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BundleEdge {
    pub source: LonLat,
    pub target: LonLat,
}

/// Summary of a bundling run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundlingSummary {
    pub passes: usize,
    pub merges: usize,
    pub ink_saved: Meter,
    pub ink_before: Meter,
    pub ink_after: Meter,
    /// Alive nodes at the end of the run.
    pub nodes: usize,
}

/// Bundling settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeBundler {
    pub tolerance: f64,
    pub max_iter: usize,
    pub max_passes: usize,
}

impl Default for EdgeBundler {
    fn default() -> Self {
        Self::from(&AtlasParams::default())
    }
}

impl From<&AtlasParams> for EdgeBundler {
    fn from(params: &AtlasParams) -> Self {
        EdgeBundler {
            tolerance: params.golden_tolerance,
            max_iter: params.golden_max_iter,
            max_passes: params.max_passes,
        }
    }
}

/// Best merge found for a node during a pass.
struct Candidate {
    neighbor: NodeId,
    gain: Meter,
    control_points: (LonLat, LonLat),
}

/// Total ink of the alive nodes.
pub fn total_ink(graph: &ProximityGraph) -> Meter {
    graph
        .nodes()
        .iter()
        .filter(|node| node.is_alive())
        .map(node_ink)
        .sum()
}

impl EdgeBundler {
    fn best_candidate(&self, graph: &ProximityGraph, id: NodeId) -> Option<Candidate> {
        let node = graph.node(id)?;
        let own_ink = node_ink(node);

        let mut best: Option<Candidate> = None;
        for neighbor in graph.live_neighbors(id) {
            let Some(other) = graph.node(neighbor) else {
                continue;
            };
            let union: Vec<_> = node
                .segments
                .iter()
                .chain(other.segments.iter())
                .copied()
                .collect();
            let Some(fit) = best_bundle(&union, self.tolerance, self.max_iter) else {
                continue;
            };
            let gain = own_ink + node_ink(other) - fit.ink;
            if gain > EPS && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Candidate {
                    neighbor,
                    gain,
                    control_points: (fit.m1, fit.m2),
                });
            }
        }
        best
    }

    /// One bundling pass.
    ///
    /// Return
    /// ----------
    /// * `(ink saved, number of merges)`.
    pub fn pass(&self, graph: &mut ProximityGraph) -> (Meter, usize) {
        graph.reset_groups();
        let mut next_group = 0;
        let mut saved = 0.0;
        let mut merges = 0;

        for id in 0..graph.len() {
            let Some(node) = graph.node(id) else {
                continue;
            };
            if !node.is_alive() || node.group.is_some() {
                continue;
            }

            match self.best_candidate(graph, id) {
                Some(candidate) => {
                    let group = match graph.node(candidate.neighbor).and_then(|n| n.group) {
                        Some(group) => group,
                        None => {
                            next_group += 1;
                            next_group - 1
                        }
                    };
                    graph.merge(id, candidate.neighbor, candidate.control_points);
                    graph.set_group(id, group);
                    graph.set_group(candidate.neighbor, group);
                    saved += candidate.gain;
                    merges += 1;
                }
                None => {
                    graph.set_group(id, next_group);
                    next_group += 1;
                }
            }
        }

        graph.compact();
        debug!(saved, merges, nodes = graph.len(), "bundling pass");
        (saved, merges)
    }

    /// Bundle until no pass saves ink.
    ///
    /// Arguments
    /// -----------------
    /// * `graph`: the proximity graph, bundled in place.
    /// * `should_cancel`: polled before each pass; a pass always runs to completion.
    ///
    /// Return
    /// ----------
    /// * The run summary, or `AtlasError::JobCancelled` if `should_cancel` returned `true`. The
    ///   graph then holds the state of the last completed pass.
    pub fn run_with_cancel<F>(
        &self,
        graph: &mut ProximityGraph,
        mut should_cancel: F,
    ) -> Result<BundlingSummary, AtlasError>
    where
        F: FnMut() -> bool,
    {
        let ink_before = total_ink(graph);
        let mut ink_saved = 0.0;
        let mut merges = 0;
        let mut passes = 0;

        while passes < self.max_passes {
            if should_cancel() {
                return Err(AtlasError::JobCancelled("bundling"));
            }
            let (saved, merged) = self.pass(graph);
            passes += 1;
            ink_saved += saved;
            merges += merged;
            if merged == 0 {
                break;
            }
        }

        let summary = BundlingSummary {
            passes,
            merges,
            ink_saved,
            ink_before,
            ink_after: total_ink(graph),
            nodes: graph.len(),
        };
        info!(
            passes,
            merges,
            nodes = summary.nodes,
            ink_saved_km = ink_saved / 1000.0,
            "bundling finished"
        );
        Ok(summary)
    }

    /// [`run_with_cancel`](EdgeBundler::run_with_cancel) without cancellation.
    ///
    /// Return
    /// ----------
    /// * The total ink saved, in meters.
    pub fn bundle(&self, graph: &mut ProximityGraph) -> Meter {
        match self.run_with_cancel(graph, || false) {
            Ok(summary) => summary.ink_saved,
            Err(_) => 0.0,
        }
    }
}

/// Drawing of a bundled graph.
///
/// A node with control points emits `start → m1` and `m2 → end` for each of its segments plus
/// one shared `m1 → m2` (so `2n + 1` edges for `n` segments); any other node emits its segments
/// as they are.
pub fn render_edges(graph: &ProximityGraph) -> Vec<BundleEdge> {
    let mut edges = Vec::new();
    for node in graph.nodes().iter().filter(|n| n.is_alive()) {
        match node.control_points {
            Some((m1, m2)) => {
                for q in &node.segments {
                    edges.push(BundleEdge {
                        source: [q[0], q[1]],
                        target: m1,
                    });
                    edges.push(BundleEdge {
                        source: m2,
                        target: [q[2], q[3]],
                    });
                }
                edges.push(BundleEdge {
                    source: m1,
                    target: m2,
                });
            }
            None => edges.extend(node.segments.iter().map(|q| BundleEdge {
                source: [q[0], q[1]],
                target: [q[2], q[3]],
            })),
        }
    }
    edges
}
