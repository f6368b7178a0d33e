//! # Tuning parameters of the atlas
//!
//! [`AtlasParams`] gathers every knob of the three algorithms and of the periodic jobs. Build it
//! with [`AtlasParams::default`] or through the validating [`AtlasParamsBuilder`].
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;
use std::time::Duration;

use crate::atlas_errors::AtlasError;
use crate::constants::{
    Degree, ResolutionLevel, DEFAULT_DECISION_INTERVAL, DEFAULT_INACTIVITY_DAYS,
    DEFAULT_LOW_TRAFFIC_THRESHOLD, DEFAULT_MAX_PASSES, DEFAULT_MAX_WAYPOINTS,
    DEFAULT_PROXIMITY_K, DEFAULT_PROXIMITY_RADIUS, DEFAULT_WINDOW_SIZE, GOLDEN_MAX_ITER,
    GOLDEN_TOLERANCE, MAX_FLOW_RESULTS,
};

/// Configuration of the simplifier, the flow aggregator, the bundler and the scheduler.
///
/// Fields
/// -----------------
/// Simplifier:
/// * `window_size` – number of raw samples kept per CUSUM channel.
/// * `decision_interval` – CUSUM decision interval `h` (reference value is `h / 2`).
/// * `max_waypoints` – maximum retained waypoints per trajectory.
/// * `inactivity_days` – trajectories without reports for longer are swept.
///
/// Flows:
/// * `resolutions` – levels maintained by the aggregator.
/// * `low_traffic_threshold` – edges with `count < threshold` are eligible for cleanup.
/// * `flow_retention_days` – default age used by the periodic cleanup.
/// * `max_flow_results` – hard cap on one flow query.
///
/// Bundling:
/// * `proximity_radius` – 4-D distance (degrees) under which two segments are neighbors.
/// * `proximity_k` – maximum neighbors linked per segment.
/// * `golden_tolerance` – golden-section bracket width at which the search stops.
/// * `golden_max_iter` – safety bound on golden-section iterations.
/// * `max_passes` – safety bound on bundling passes.
///
/// Scheduler:
/// * `aggregation_period`, `cleanup_period`, `bundling_period`, `sweep_period`.
///
/// Defaults
/// -----------------
/// * `window_size`: 5, `decision_interval`: 1.0, `max_waypoints`: 500, `inactivity_days`: 7
/// * `resolutions`: coarse, medium, fine; `low_traffic_threshold`: 2; `flow_retention_days`: 7;
///   `max_flow_results`: 10 000
/// * `proximity_radius`: 0.05°, `proximity_k`: 8, `golden_tolerance`: 1e-5,
///   `golden_max_iter`: 100, `max_passes`: 64
/// * periods: aggregation 1 h, cleanup 24 h, bundling 6 h, sweep 1 h
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasParams {
    // --- Simplifier ---
    pub window_size: usize,
    pub decision_interval: f64,
    pub max_waypoints: usize,
    pub inactivity_days: f64,

    // --- Flows ---
    pub resolutions: Vec<ResolutionLevel>,
    pub low_traffic_threshold: u64,
    pub flow_retention_days: f64,
    pub max_flow_results: usize,

    // --- Bundling ---
    pub proximity_radius: Degree,
    pub proximity_k: usize,
    pub golden_tolerance: f64,
    pub golden_max_iter: usize,
    pub max_passes: usize,

    // --- Scheduler ---
    pub aggregation_period: Duration,
    pub cleanup_period: Duration,
    pub bundling_period: Duration,
    pub sweep_period: Duration,
}

impl AtlasParams {
    /// Equivalent to [`AtlasParams::default()`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`AtlasParamsBuilder`] initialized with the defaults.
    pub fn builder() -> AtlasParamsBuilder {
        AtlasParamsBuilder::new()
    }
}

impl Default for AtlasParams {
    fn default() -> Self {
        AtlasParams {
            window_size: DEFAULT_WINDOW_SIZE,
            decision_interval: DEFAULT_DECISION_INTERVAL,
            max_waypoints: DEFAULT_MAX_WAYPOINTS,
            inactivity_days: DEFAULT_INACTIVITY_DAYS,

            resolutions: ResolutionLevel::ALL.to_vec(),
            low_traffic_threshold: DEFAULT_LOW_TRAFFIC_THRESHOLD,
            flow_retention_days: 7.0,
            max_flow_results: MAX_FLOW_RESULTS,

            proximity_radius: DEFAULT_PROXIMITY_RADIUS,
            proximity_k: DEFAULT_PROXIMITY_K,
            golden_tolerance: GOLDEN_TOLERANCE,
            golden_max_iter: GOLDEN_MAX_ITER,
            max_passes: DEFAULT_MAX_PASSES,

            aggregation_period: Duration::from_secs(3600),
            cleanup_period: Duration::from_secs(24 * 3600),
            bundling_period: Duration::from_secs(6 * 3600),
            sweep_period: Duration::from_secs(3600),
        }
    }
}

/// Builder for [`AtlasParams`], with validation.
#[derive(Debug, Clone)]
pub struct AtlasParamsBuilder {
    params: AtlasParams,
}

impl Default for AtlasParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AtlasParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: AtlasParams::default(),
        }
    }

    // --- Simplifier ---
    pub fn window_size(mut self, v: usize) -> Self {
        self.params.window_size = v;
        self
    }
    pub fn decision_interval(mut self, v: f64) -> Self {
        self.params.decision_interval = v;
        self
    }
    pub fn max_waypoints(mut self, v: usize) -> Self {
        self.params.max_waypoints = v;
        self
    }
    pub fn inactivity_days(mut self, v: f64) -> Self {
        self.params.inactivity_days = v;
        self
    }

    // --- Flows ---
    pub fn resolutions(mut self, v: &[ResolutionLevel]) -> Self {
        self.params.resolutions = v.to_vec();
        self
    }
    pub fn low_traffic_threshold(mut self, v: u64) -> Self {
        self.params.low_traffic_threshold = v;
        self
    }
    pub fn flow_retention_days(mut self, v: f64) -> Self {
        self.params.flow_retention_days = v;
        self
    }
    pub fn max_flow_results(mut self, v: usize) -> Self {
        self.params.max_flow_results = v;
        self
    }

    // --- Bundling ---
    pub fn proximity_radius(mut self, v: Degree) -> Self {
        self.params.proximity_radius = v;
        self
    }
    pub fn proximity_k(mut self, v: usize) -> Self {
        self.params.proximity_k = v;
        self
    }
    pub fn golden_tolerance(mut self, v: f64) -> Self {
        self.params.golden_tolerance = v;
        self
    }
    pub fn golden_max_iter(mut self, v: usize) -> Self {
        self.params.golden_max_iter = v;
        self
    }
    pub fn max_passes(mut self, v: usize) -> Self {
        self.params.max_passes = v;
        self
    }

    // --- Scheduler ---
    pub fn aggregation_period(mut self, v: Duration) -> Self {
        self.params.aggregation_period = v;
        self
    }
    pub fn cleanup_period(mut self, v: Duration) -> Self {
        self.params.cleanup_period = v;
        self
    }
    pub fn bundling_period(mut self, v: Duration) -> Self {
        self.params.bundling_period = v;
        self
    }
    pub fn sweep_period(mut self, v: Duration) -> Self {
        self.params.sweep_period = v;
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder and produce an [`AtlasParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `window_size ≥ 1`, `max_waypoints ≥ 2`, `decision_interval > 0`, `inactivity_days ≥ 0`.
    /// * `resolutions` non-empty, `low_traffic_threshold ≥ 1`, `flow_retention_days ≥ 0`,
    ///   `1 ≤ max_flow_results ≤ 10 000`.
    /// * `proximity_radius > 0`, `proximity_k ≥ 1`, `0 < golden_tolerance < 1`,
    ///   `golden_max_iter ≥ 1`, `max_passes ≥ 1`.
    /// * every scheduler period is non-zero.
    ///
    /// Returns
    /// -----------------
    /// * `Ok(AtlasParams)` if all values are valid.
    /// * `Err(AtlasError::InvalidParameter)` naming the first failing rule.
    pub fn build(self) -> Result<AtlasParams, AtlasError> {
        let p = &self.params;
        let invalid = |msg: &str| Err(AtlasError::InvalidParameter(msg.into()));

        if p.window_size == 0 {
            return invalid("window_size must be >= 1");
        }
        if p.max_waypoints < 2 {
            return invalid("max_waypoints must be >= 2");
        }
        if !Self::gt0(p.decision_interval) || !p.decision_interval.is_finite() {
            return invalid("decision_interval must be > 0");
        }
        if !Self::ge0(p.inactivity_days) {
            return invalid("inactivity_days must be non-negative");
        }

        if p.resolutions.is_empty() {
            return invalid("at least one resolution is required");
        }
        if p.low_traffic_threshold == 0 {
            return invalid("low_traffic_threshold must be >= 1");
        }
        if !Self::ge0(p.flow_retention_days) {
            return invalid("flow_retention_days must be non-negative");
        }
        if p.max_flow_results == 0 || p.max_flow_results > MAX_FLOW_RESULTS {
            return invalid("max_flow_results must be in [1, 10000]");
        }

        if !Self::gt0(p.proximity_radius) {
            return invalid("proximity_radius must be > 0");
        }
        if p.proximity_k == 0 {
            return invalid("proximity_k must be >= 1");
        }
        if !Self::gt0(p.golden_tolerance) || p.golden_tolerance >= 1.0 {
            return invalid("golden_tolerance must be in (0, 1)");
        }
        if p.golden_max_iter == 0 {
            return invalid("golden_max_iter must be >= 1");
        }
        if p.max_passes == 0 {
            return invalid("max_passes must be >= 1");
        }

        let periods = [
            p.aggregation_period,
            p.cleanup_period,
            p.bundling_period,
            p.sweep_period,
        ];
        if periods.iter().any(Duration::is_zero) {
            return invalid("scheduler periods must be non-zero");
        }

        let mut params = self.params;
        params.resolutions.sort_unstable();
        params.resolutions.dedup();
        Ok(params)
    }
}

impl fmt::Display for AtlasParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 44; // width reserved for "name = value"
            writeln!(f, "Atlas Parameters")?;
            writeln!(f, "----------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            writeln!(f, "[Simplifier]")?;
            line!("window_size           = {}", self.window_size, "CUSUM window length")?;
            line!("decision_interval     = {:.3}", self.decision_interval, "CUSUM h")?;
            line!("max_waypoints         = {}", self.max_waypoints, "Retained waypoints per vessel")?;
            line!("inactivity_days       = {:.2} d", self.inactivity_days, "Trajectory retention")?;

            writeln!(f, "\n[Flows]")?;
            let levels: Vec<String> = self.resolutions.iter().map(|r| r.to_string()).collect();
            line!("resolutions           = {}", levels.join(", "), "Maintained levels")?;
            line!("low_traffic_threshold = {}", self.low_traffic_threshold, "Cleanup count bound")?;
            line!("flow_retention_days   = {:.2} d", self.flow_retention_days, "Cleanup age bound")?;
            line!("max_flow_results      = {}", self.max_flow_results, "Query cap")?;

            writeln!(f, "\n[Bundling]")?;
            line!("proximity_radius      = {:.4}°", self.proximity_radius, "Neighbor radius")?;
            line!("proximity_k           = {}", self.proximity_k, "Neighbors per segment")?;
            line!("golden_tolerance      = {:.1e}", self.golden_tolerance, "Bracket width")?;
            line!("golden_max_iter       = {}", self.golden_max_iter, "Search iteration bound")?;
            line!("max_passes            = {}", self.max_passes, "Pass bound")?;

            writeln!(f, "\n[Scheduler]")?;
            line!("aggregation_period    = {:?}", self.aggregation_period, "Full flow rebuild")?;
            line!("cleanup_period        = {:?}", self.cleanup_period, "Low-traffic cleanup")?;
            line!("bundling_period       = {:?}", self.bundling_period, "Edge bundling")?;
            line!("sweep_period          = {:?}", self.sweep_period, "Inactive trajectory sweep")?;

            Ok(())
        } else {
            write!(
                f,
                "AtlasParams(window={}, h={:.2}, max_waypoints={}, resolutions={}, low_traffic<{}, radius={:.3}°, k={}, max_passes={})",
                self.window_size,
                self.decision_interval,
                self.max_waypoints,
                self.resolutions.len(),
                self.low_traffic_threshold,
                self.proximity_radius,
                self.proximity_k,
                self.max_passes,
            )
        }
    }
}

#[cfg(test)]
mod params_test {
    use super::*;

    #[test]
    fn test_default_builds() {
        let params = AtlasParams::builder().build().unwrap();
        assert_eq!(params, AtlasParams::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert_eq!(
            AtlasParams::builder().window_size(0).build(),
            Err(AtlasError::InvalidParameter("window_size must be >= 1".into()))
        );
        assert!(AtlasParams::builder().decision_interval(f64::NAN).build().is_err());
        assert!(AtlasParams::builder().decision_interval(-1.0).build().is_err());
        assert!(AtlasParams::builder().resolutions(&[]).build().is_err());
        assert!(AtlasParams::builder().golden_tolerance(1.5).build().is_err());
        assert!(AtlasParams::builder().max_flow_results(20_000).build().is_err());
        assert!(AtlasParams::builder()
            .bundling_period(Duration::ZERO)
            .build()
            .is_err());
    }

    #[test]
    fn test_resolutions_are_sorted_and_deduplicated() {
        let params = AtlasParams::builder()
            .resolutions(&[ResolutionLevel::Fine, ResolutionLevel::Coarse, ResolutionLevel::Fine])
            .build()
            .unwrap();
        assert_eq!(params.resolutions, vec![ResolutionLevel::Coarse, ResolutionLevel::Fine]);
    }

    #[test]
    fn test_display() {
        let params = AtlasParams::default();
        let compact = format!("{params}");
        assert!(compact.starts_with("AtlasParams(window=5"));
        let pretty = format!("{params:#}");
        assert!(pretty.contains("[Bundling]"));
        assert!(pretty.contains("decision_interval     = 1.000"));
    }
}
