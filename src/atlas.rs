//! # Atlas: ingestion path, read APIs and batch operations
//!
//! The [`Atlas`] struct wires together the three parts of the crate:
//!
//! 1. **Trajectory simplifier** ([`Simplifier`]) over a [`TrajectoryStore`]: every position report
//!    goes through [`Atlas::ingest`], which may append a waypoint to the vessel trajectory.
//! 2. **Flow aggregator** ([`FlowAggregator`]): each new waypoint is folded into the flow table
//!    right away; [`Atlas::aggregate_all`] rebuilds the table from scratch.
//! 3. **Edge bundler** ([`EdgeBundler`]): [`Atlas::run_bundling`] builds the spatial graph of the
//!    trajectories, bundles it and publishes the rendered edges.
//!
//! ## Typical usage
//!
//! ```rust, no_run
//! use argoatlas::atlas::Atlas;
//! use argoatlas::constants::ResolutionLevel;
//! use argoatlas::params::AtlasParams;
//! use argoatlas::reports::csv_reader::read_reports_from_path;
//!
//! let atlas = Atlas::new(AtlasParams::default());
//! let reports = read_reports_from_path("ais.csv").unwrap();
//! let summary = atlas.ingest_all(&reports).unwrap();
//! println!("{summary}");
//!
//! let busiest = atlas.flows(ResolutionLevel::Coarse, 2).unwrap();
//! let bundling = atlas.run_bundling().unwrap();
//! let drawing = atlas.bundled_edges().unwrap();
//! ```
//!
//! ## Concurrency
//!
//! `Atlas` is `Send + Sync` and meant to be shared behind an `Arc` (see
//! [`Scheduler`](crate::scheduler::Scheduler)). Reports of one vessel must be ingested
//! sequentially; different vessels may be ingested concurrently. The full aggregation and the
//! bundling run are single-writer jobs: a second concurrent request fails with
//! [`AtlasError::JobAlreadyRunning`]. Reads return the last committed flow table and the last
//! published bundle drawing.
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock};

use hifitime::Epoch;
use tracing::{debug, info};

use crate::atlas_errors::AtlasError;
use crate::bundling::{render_edges, BundleEdge, BundlingSummary, EdgeBundler};
use crate::constants::{ResolutionLevel, VesselId};
use crate::flows::aggregator::FlowAggregator;
use crate::flows::{FlowStats, FlowView};
use crate::graph::proximity::ProximityGraph;
use crate::graph::Graph;
use crate::params::AtlasParams;
use crate::reports::ais_message::decode_ais_message;
use crate::reports::PositionReport;
use crate::scheduler::JobGuard;
use crate::time::now;
use crate::trajectories::simplifier::Simplifier;
use crate::trajectories::store::{MemoryTrajectoryStore, TrajectoryStore};
use crate::trajectories::{Trajectory, Waypoint};

/// Counters of a batch ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub reports: usize,
    pub rejected: usize,
    pub waypoints: usize,
}

impl fmt::Display for IngestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reports={}, rejected={}, waypoints={}",
            self.reports, self.rejected, self.waypoints
        )
    }
}

/// Published output of the last complete bundling run.
#[derive(Debug, Clone, Default)]
struct BundleOutput {
    edges: Vec<BundleEdge>,
    summary: Option<BundlingSummary>,
}

pub struct Atlas {
    params: AtlasParams,
    simplifier: Simplifier,
    store: Arc<dyn TrajectoryStore>,
    flows: FlowAggregator,
    bundler: EdgeBundler,
    bundles: RwLock<BundleOutput>,
    aggregation_running: AtomicBool,
    bundling_running: AtomicBool,
}

impl fmt::Debug for Atlas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Atlas")
            .field("params", &self.params)
            .field("flows", &self.flows)
            .finish_non_exhaustive()
    }
}

fn poisoned<T>(_: T) -> AtlasError {
    AtlasError::StorageUnavailable("bundle output lock poisoned".into())
}

impl Atlas {
    /// An atlas over an in-memory trajectory store.
    pub fn new(params: AtlasParams) -> Self {
        Self::with_store(params, Arc::new(MemoryTrajectoryStore::new()))
    }

    /// An atlas over a caller-provided trajectory store.
    pub fn with_store(params: AtlasParams, store: Arc<dyn TrajectoryStore>) -> Self {
        Atlas {
            simplifier: Simplifier::from(&params),
            flows: FlowAggregator::new(&params),
            bundler: EdgeBundler::from(&params),
            params,
            store,
            bundles: RwLock::new(BundleOutput::default()),
            aggregation_running: AtomicBool::new(false),
            bundling_running: AtomicBool::new(false),
        }
    }

    pub fn params(&self) -> &AtlasParams {
        &self.params
    }

    pub fn store(&self) -> &Arc<dyn TrajectoryStore> {
        &self.store
    }

    // ---------------------------------------------------------------------------------------------
    // Ingestion
    // ---------------------------------------------------------------------------------------------

    /// Process one position report.
    ///
    /// Return
    /// ----------
    /// * `Ok(Some(waypoint))` if the report became a waypoint; the flow table already includes
    ///   the new segment.
    /// * `Ok(None)` if the report only updated the vessel state.
    /// * `Err(AtlasError::RejectedReport)` for an inaccurate or position-less report, which
    ///   leaves every state untouched.
    pub fn ingest(&self, report: &PositionReport) -> Result<Option<Waypoint>, AtlasError> {
        let sample = report.to_sample()?;
        let waypoint = self
            .simplifier
            .observe(self.store.as_ref(), report.vessel_id, &sample)?;

        if waypoint.is_some() {
            if let Some(trajectory) = self.store.find(report.vessel_id)? {
                self.flows.incremental(&trajectory)?;
            }
        }
        Ok(waypoint)
    }

    /// Process a batch of reports in order. Rejected reports are logged and counted.
    pub fn ingest_all<'a>(
        &self,
        reports: impl IntoIterator<Item = &'a PositionReport>,
    ) -> Result<IngestSummary, AtlasError> {
        let mut summary = IngestSummary::default();
        for report in reports {
            summary.reports += 1;
            match self.ingest(report) {
                Ok(Some(_)) => summary.waypoints += 1,
                Ok(None) => {}
                Err(AtlasError::RejectedReport(reason)) => {
                    debug!(%reason, "report rejected");
                    summary.rejected += 1;
                }
                Err(err) => return Err(err),
            }
        }
        info!(%summary, "reports ingested");
        Ok(summary)
    }

    /// Decode and process one message of the AIS stream.
    ///
    /// Messages that are not position reports are ignored (`Ok(None)`).
    pub fn ingest_json(&self, json: &str, received: Epoch) -> Result<Option<Waypoint>, AtlasError> {
        match decode_ais_message(json, received)? {
            Some(report) => self.ingest(&report),
            None => Ok(None),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------------------------------

    pub fn trajectories(&self) -> Result<Vec<Trajectory>, AtlasError> {
        let mut all = self.store.all()?;
        all.sort_by_key(|t| t.vessel_id);
        Ok(all)
    }

    pub fn trajectory(&self, vessel_id: VesselId) -> Result<Option<Trajectory>, AtlasError> {
        self.store.find(vessel_id)
    }

    /// Flows at `level` with at least `min_count` transitions, busiest first.
    pub fn flows(&self, level: ResolutionLevel, min_count: u64) -> Result<Vec<FlowView>, AtlasError> {
        self.flows.flows(level, min_count)
    }

    pub fn flows_for_zoom(&self, zoom: u8, min_count: u64) -> Result<Vec<FlowView>, AtlasError> {
        self.flows.flows_for_zoom(zoom, min_count)
    }

    pub fn flow_stats(&self, top_n: usize) -> Result<Vec<FlowStats>, AtlasError> {
        self.flows.stats(top_n)
    }

    /// Edges of the last published bundle drawing (empty before the first run).
    pub fn bundled_edges(&self) -> Result<Vec<BundleEdge>, AtlasError> {
        Ok(self.bundles.read().map_err(poisoned)?.edges.clone())
    }

    pub fn last_bundling(&self) -> Result<Option<BundlingSummary>, AtlasError> {
        Ok(self.bundles.read().map_err(poisoned)?.summary)
    }

    // ---------------------------------------------------------------------------------------------
    // Batch operations
    // ---------------------------------------------------------------------------------------------

    /// Rebuild the flow table from every stored trajectory.
    ///
    /// Return
    /// ----------
    /// * The number of flows after the rebuild.
    /// * `Err(AtlasError::JobAlreadyRunning)` if a rebuild is in progress.
    pub fn aggregate_all(&self) -> Result<usize, AtlasError> {
        let _guard = JobGuard::acquire(&self.aggregation_running, "aggregation")?;
        let snapshot = self.trajectories()?;
        self.flows.aggregate_all(&snapshot)?;

        // catch up with waypoints accepted while the table was rebuilt
        for trajectory in self.store.all()? {
            self.flows.incremental(&trajectory)?;
        }
        self.flows.len()
    }

    /// Delete low-traffic flows not updated for `days_old` days.
    pub fn cleanup(&self, days_old: f64) -> Result<usize, AtlasError> {
        self.cleanup_at(now()?, days_old)
    }

    /// [`cleanup`](Atlas::cleanup) relative to `now`.
    pub fn cleanup_at(&self, now: Epoch, days_old: f64) -> Result<usize, AtlasError> {
        let deleted = self.flows.cleanup(now, days_old)?;
        info!(deleted, days_old, "flow cleanup");
        Ok(deleted)
    }

    pub fn clear_flows(&self) -> Result<(), AtlasError> {
        self.flows.clear()?;
        info!("flow table cleared");
        Ok(())
    }

    /// Delete trajectories without any report for `inactivity_days`.
    pub fn sweep_inactive(&self) -> Result<Vec<VesselId>, AtlasError> {
        self.sweep_inactive_at(now()?)
    }

    /// [`sweep_inactive`](Atlas::sweep_inactive) relative to `now`.
    pub fn sweep_inactive_at(&self, now: Epoch) -> Result<Vec<VesselId>, AtlasError> {
        let deleted =
            self.simplifier
                .sweep_inactive(self.store.as_ref(), now, self.params.inactivity_days)?;
        self.flows.forget(&deleted)?;
        if !deleted.is_empty() {
            info!(deleted = deleted.len(), "inactive trajectories swept");
        }
        Ok(deleted)
    }

    /// Bundle the current trajectories and publish the drawing.
    pub fn run_bundling(&self) -> Result<BundlingSummary, AtlasError> {
        self.run_bundling_with_cancel(|| false)
    }

    /// Bundling with cooperative cancellation.
    ///
    /// Arguments
    /// -----------------
    /// * `should_cancel`: polled before each bundling pass.
    ///
    /// Return
    /// ----------
    /// * The run summary. The drawing is published only when the run completes: a cancelled
    ///   run (`AtlasError::JobCancelled`) leaves the previous drawing in place.
    /// * `Err(AtlasError::JobAlreadyRunning)` if another bundling run is in progress.
    pub fn run_bundling_with_cancel<F>(&self, should_cancel: F) -> Result<BundlingSummary, AtlasError>
    where
        F: FnMut() -> bool,
    {
        let _guard = JobGuard::acquire(&self.bundling_running, "bundling")?;

        // vertex ids, hence segment directions, follow vessel order
        let trajectories = self.trajectories()?;
        let graph = Graph::from_trajectories(&trajectories);
        let mut proximity = ProximityGraph::build(
            &graph,
            self.params.proximity_radius,
            self.params.proximity_k,
        );
        let summary = self.bundler.run_with_cancel(&mut proximity, should_cancel)?;
        let edges = render_edges(&proximity);

        let mut output = self.bundles.write().map_err(poisoned)?;
        output.edges = edges;
        output.summary = Some(summary);
        Ok(summary)
    }
}
