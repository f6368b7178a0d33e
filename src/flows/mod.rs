//! # Flows: multi-resolution cell-to-cell traffic
//!
//! A flow is a directed, counted transition between two **adjacent** H3 cells, observed at one
//! of the [`ResolutionLevel`]s. Every retained segment of every simplified trajectory is mapped
//! at each configured level; segments that stay in one cell or jump over cells are ignored.
//!
//! Modules
//! -----------------
//! * [`hex_grid`](crate::flows::hex_grid) – position → cell mapping and adjacency (h3o).
//! * [`aggregator`](crate::flows::aggregator) – the [`FlowAggregator`](crate::flows::aggregator::FlowAggregator): flow table, watermarks, queries, cleanup.
//!
//! Identity
//! -----------------
//! A [`FlowEdge`] is unique by [`FlowKey`] `= (source_cell, target_cell, resolution)`; its count
//! is the number of segments that performed the transition.
use std::fmt;

use h3o::CellIndex;
use hifitime::Epoch;
use serde::Serialize;

use crate::constants::{LonLat, ResolutionLevel};

pub mod aggregator;
pub mod hex_grid;

/// Identity of a flow edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    pub source_cell: CellIndex,
    pub target_cell: CellIndex,
    pub resolution: ResolutionLevel,
}

/// A counted directed transition between two adjacent cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowEdge {
    pub key: FlowKey,
    pub count: u64,
    /// Center of the source cell, `[lon, lat]`.
    pub source_coords: LonLat,
    /// Center of the target cell, `[lon, lat]`.
    pub target_coords: LonLat,
    /// Time of the most recent segment that performed the transition.
    pub last_updated: Epoch,
}

impl FlowEdge {
    /// Render intensity, `log10(count + 1)`.
    #[inline]
    pub fn intensity(&self) -> f64 {
        (self.count as f64 + 1.0).log10()
    }

    pub fn view(&self) -> FlowView {
        FlowView {
            source: self.source_coords,
            target: self.target_coords,
            count: self.count,
            intensity: self.intensity(),
        }
    }
}

/// Read model of a flow, as served to map clients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowView {
    pub source: LonLat,
    pub target: LonLat,
    pub count: u64,
    pub intensity: f64,
}

/// Flow table summary for one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowStats {
    pub resolution: ResolutionLevel,
    /// Number of distinct flows at this resolution.
    pub total: usize,
    /// Sum of the counts at this resolution.
    pub transitions: u64,
    /// Busiest flows, highest count first.
    pub busiest: Vec<FlowView>,
}

impl fmt::Display for FlowStats {
    /// Compact by default; multi-line listing of the busiest flows with `{:#}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Flows at {}", self.resolution)?;
            writeln!(f, "-----------------------------------------")?;
            writeln!(f, "flows       : {}", self.total)?;
            write!(f, "transitions : {}", self.transitions)?;
            for (rank, flow) in self.busiest.iter().enumerate() {
                write!(
                    f,
                    "\n#{:<3} ({:>9.4}, {:>8.4}) -> ({:>9.4}, {:>8.4})  count={}",
                    rank + 1,
                    flow.source[0],
                    flow.source[1],
                    flow.target[0],
                    flow.target[1],
                    flow.count
                )?;
            }
            Ok(())
        } else {
            let top = self.busiest.first().map_or(0, |flow| flow.count);
            write!(
                f,
                "{}: flows={}, transitions={}, top={}",
                self.resolution, self.total, self.transitions, top
            )
        }
    }
}
