//! Flow table maintenance.
//!
//! The [`FlowAggregator`] owns the flow table behind a `RwLock` together with one **watermark**
//! per `(vessel, resolution)`: the absolute index of the last trajectory waypoint whose incoming
//! segment was already counted. Both the incremental path (called after each new waypoint) and
//! the full re-aggregation skip segments at or below the watermark, so feeding the same
//! trajectory twice never counts a segment twice.
//!
//! Full re-aggregation builds a fresh table off-lock from a snapshot of trajectories and swaps
//! it in under the write lock. Readers always see either the old or the new table.
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::RandomState;
use hifitime::Epoch;
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::atlas_errors::AtlasError;
use crate::constants::{ResolutionLevel, VesselId};
use crate::flows::hex_grid::{cell_center, transition};
use crate::flows::{FlowEdge, FlowKey, FlowStats, FlowView};
use crate::params::AtlasParams;
use crate::time::{days, is_older_than};
use crate::trajectories::Trajectory;

/// The flow edges and the per-vessel watermarks, always updated together.
#[derive(Debug, Clone, Default)]
pub struct FlowTable {
    edges: HashMap<FlowKey, FlowEdge, RandomState>,
    watermarks: HashMap<(VesselId, ResolutionLevel), u64, RandomState>,
}

impl FlowTable {
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowEdge> {
        self.edges.get(key)
    }

    pub fn edges(&self) -> impl Iterator<Item = &FlowEdge> {
        self.edges.values()
    }

    /// Absolute index of the last counted waypoint of `vessel` at `level`.
    pub fn watermark(&self, vessel: VesselId, level: ResolutionLevel) -> Option<u64> {
        self.watermarks.get(&(vessel, level)).copied()
    }

    /// Count the not-yet-counted segments of `trajectory` at `level`.
    ///
    /// Return
    /// ----------
    /// * The number of distinct flow edges created or incremented.
    fn absorb(&mut self, trajectory: &Trajectory, level: ResolutionLevel) -> usize {
        let key = (trajectory.vessel_id, level);
        let mark = self.watermarks.get(&key).copied();

        // per-edge (count, latest time) of this batch
        let mut pending: HashMap<FlowKey, (u64, Epoch), RandomState> = HashMap::default();
        for (end_index, start, end) in trajectory.segments() {
            if mark.is_some_and(|m| end_index <= m) {
                continue;
            }
            match transition(start.position, end.position, level) {
                Ok(Some((source_cell, target_cell))) => {
                    let flow_key = FlowKey {
                        source_cell,
                        target_cell,
                        resolution: level,
                    };
                    let entry = pending.entry(flow_key).or_insert((0, end.time));
                    entry.0 += 1;
                    entry.1 = entry.1.max(end.time);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(vessel = %trajectory.vessel_id, %err, "segment skipped");
                }
            }
        }

        if !trajectory.waypoints.is_empty() {
            self.watermarks.insert(key, trajectory.total_waypoints - 1);
        }

        let written = pending.len();
        for (flow_key, (count, time)) in pending {
            self.edges
                .entry(flow_key)
                .and_modify(|edge| {
                    edge.count += count;
                    edge.last_updated = edge.last_updated.max(time);
                })
                .or_insert_with(|| FlowEdge {
                    key: flow_key,
                    count,
                    source_coords: cell_center(flow_key.source_cell),
                    target_coords: cell_center(flow_key.target_cell),
                    last_updated: time,
                });
        }
        written
    }
}

/// Flow aggregation and queries.
#[derive(Debug)]
pub struct FlowAggregator {
    resolutions: Vec<ResolutionLevel>,
    low_traffic_threshold: u64,
    max_results: usize,
    table: RwLock<FlowTable>,
}

impl Default for FlowAggregator {
    fn default() -> Self {
        Self::new(&AtlasParams::default())
    }
}

fn poisoned<T>(_: T) -> AtlasError {
    AtlasError::StorageUnavailable("flow table lock poisoned".into())
}

impl FlowAggregator {
    pub fn new(params: &AtlasParams) -> Self {
        FlowAggregator {
            resolutions: params.resolutions.clone(),
            low_traffic_threshold: params.low_traffic_threshold,
            max_results: params.max_flow_results,
            table: RwLock::new(FlowTable::default()),
        }
    }

    /// Configured resolutions, coarse first.
    pub fn resolutions(&self) -> &[ResolutionLevel] {
        &self.resolutions
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, FlowTable>, AtlasError> {
        self.table.read().map_err(poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, FlowTable>, AtlasError> {
        self.table.write().map_err(poisoned)
    }

    /// Count the new segments of `trajectory` at each of `resolutions`.
    ///
    /// Return
    /// ----------
    /// * The number of flow edges (re)written, summed over the resolutions.
    pub fn aggregate(
        &self,
        trajectory: &Trajectory,
        resolutions: &[ResolutionLevel],
    ) -> Result<usize, AtlasError> {
        let mut table = self.write()?;
        Ok(resolutions
            .iter()
            .map(|&level| table.absorb(trajectory, level))
            .sum())
    }

    /// [`aggregate`](FlowAggregator::aggregate) at the configured resolutions, called after the
    /// simplifier accepted a waypoint.
    pub fn incremental(&self, trajectory: &Trajectory) -> Result<usize, AtlasError> {
        self.aggregate(trajectory, &self.resolutions)
    }

    /// Rebuild the whole table from `trajectories` and swap it in.
    ///
    /// Arguments
    /// -----------------
    /// * `trajectories`: a snapshot of every stored trajectory.
    ///
    /// Return
    /// ----------
    /// * The number of flow edges in the new table.
    ///
    /// Notes
    /// ----------
    /// * Incremental updates that land on the old table while the new one is built are lost
    ///   with it; the new watermarks stop at the snapshot, so replaying `incremental` on the
    ///   current trajectories afterwards counts exactly the missing segments.
    pub fn aggregate_all(&self, trajectories: &[Trajectory]) -> Result<usize, AtlasError> {
        let mut fresh = FlowTable::default();
        for trajectory in trajectories {
            for &level in &self.resolutions {
                fresh.absorb(trajectory, level);
            }
        }
        let total = fresh.len();
        *self.write()? = fresh;
        info!(
            trajectories = trajectories.len(),
            flows = total,
            "flow table rebuilt"
        );
        Ok(total)
    }

    /// Flows at `level` with `count >= min_count`, busiest first, capped at the configured
    /// maximum number of results.
    pub fn flows(
        &self,
        level: ResolutionLevel,
        min_count: u64,
    ) -> Result<Vec<FlowView>, AtlasError> {
        let table = self.read()?;
        Ok(table
            .edges()
            .filter(|edge| edge.key.resolution == level && edge.count >= min_count)
            .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)))
            .take(self.max_results)
            .map(FlowEdge::view)
            .collect())
    }

    /// Flows for a web-map zoom level.
    pub fn flows_for_zoom(&self, zoom: u8, min_count: u64) -> Result<Vec<FlowView>, AtlasError> {
        self.flows(resolution_for_zoom(zoom), min_count)
    }

    /// Delete low-traffic flows not updated for `days_old` days.
    ///
    /// An edge is removed only if **both** hold: `last_updated < now - days_old` and
    /// `count < low_traffic_threshold`.
    ///
    /// Return
    /// ----------
    /// * The number of deleted edges.
    pub fn cleanup(&self, now: Epoch, days_old: f64) -> Result<usize, AtlasError> {
        let max_age = days(days_old);
        let threshold = self.low_traffic_threshold;
        let mut table = self.write()?;
        let before = table.edges.len();
        table.edges.retain(|_, edge| {
            !(is_older_than(edge.last_updated, now, max_age) && edge.count < threshold)
        });
        let deleted = before - table.edges.len();
        debug!(deleted, remaining = table.edges.len(), "flow cleanup");
        Ok(deleted)
    }

    /// Empty the table and every watermark.
    pub fn clear(&self) -> Result<(), AtlasError> {
        *self.write()? = FlowTable::default();
        Ok(())
    }

    /// Drop the watermarks of deleted trajectories; their flows stay counted.
    pub fn forget(&self, vessels: &[VesselId]) -> Result<(), AtlasError> {
        if vessels.is_empty() {
            return Ok(());
        }
        let mut table = self.write()?;
        table
            .watermarks
            .retain(|(vessel, _), _| !vessels.contains(vessel));
        Ok(())
    }

    /// Number of flows, all resolutions together.
    pub fn len(&self) -> Result<usize, AtlasError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AtlasError> {
        Ok(self.read()?.is_empty())
    }

    /// Copy of the committed table.
    pub fn snapshot(&self) -> Result<FlowTable, AtlasError> {
        Ok(self.read()?.clone())
    }

    /// Per configured resolution: number of flows, total transitions and the `top_n` busiest.
    pub fn stats(&self, top_n: usize) -> Result<Vec<FlowStats>, AtlasError> {
        let table = self.read()?;
        let by_level = table.edges().into_group_map_by(|edge| edge.key.resolution);

        Ok(self
            .resolutions
            .iter()
            .map(|&level| {
                let edges = by_level.get(&level).map(Vec::as_slice).unwrap_or_default();
                FlowStats {
                    resolution: level,
                    total: edges.len(),
                    transitions: edges.iter().map(|edge| edge.count).sum(),
                    busiest: edges
                        .iter()
                        .sorted_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)))
                        .take(top_n)
                        .map(|edge| edge.view())
                        .collect(),
                }
            })
            .collect())
    }
}

/// Resolution to render at a web-map zoom level.
pub fn resolution_for_zoom(zoom: u8) -> ResolutionLevel {
    ResolutionLevel::for_zoom(zoom)
}
