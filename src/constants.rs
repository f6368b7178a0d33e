//! # Constants and type definitions for ArgoAtlas
//!
//! This module centralizes the **geophysical constants**, **unit aliases**, **identifiers** and
//! **default tuning values** used throughout the `argoatlas` library.
//!
//! ## Overview
//!
//! - Earth model constants used by the ink / distance computations
//! - Unit aliases (degrees, meters, knots)
//! - Vessel identifiers (MMSI)
//! - The three flow resolutions and their H3 levels
//! - Default values shared by [`AtlasParams`](crate::params::AtlasParams)

// -------------------------------------------------------------------------------------------------
// Geophysical constants
// -------------------------------------------------------------------------------------------------

/// Earth equatorial radius in meters (GRS1980/WGS84)
pub const EARTH_MAJOR_AXIS: f64 = 6_378_137.0;

/// Numerical epsilon used for floating-point comparisons
pub const EPS: f64 = 1e-9;

/// Number of seconds in a day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Speed in knots
pub type Knot = f64;

/// A `[longitude, latitude]` pair in degrees, the coordinate order used by every public API.
pub type LonLat = [Degree; 2];

/// A directed segment `[x1, y1, x2, y2]` = `[lon_start, lat_start, lon_end, lat_end]`.
pub type Quad = [Degree; 4];

// -------------------------------------------------------------------------------------------------
// Identifiers
// -------------------------------------------------------------------------------------------------

/// Maritime Mobile Service Identity: the key of every per-vessel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct VesselId(pub u32);

impl std::fmt::Display for VesselId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VesselId {
    fn from(n: u32) -> Self {
        VesselId(n)
    }
}

impl std::str::FromStr for VesselId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(VesselId)
    }
}

// -------------------------------------------------------------------------------------------------
// Flow resolutions
// -------------------------------------------------------------------------------------------------

/// Zoom-dependent level of detail of the flow map.
///
/// Each level maps to a fixed H3 resolution:
///
/// | Level    | H3 | Intended zoom |
/// |----------|----|---------------|
/// | `Coarse` | 3  | 0 – 4 (world) |
/// | `Medium` | 4  | 5 – 7 (region)|
/// | `Fine`   | 5  | 8+ (local)    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ResolutionLevel {
    Coarse,
    Medium,
    Fine,
}

impl ResolutionLevel {
    /// All levels, coarse first.
    pub const ALL: [ResolutionLevel; 3] = [
        ResolutionLevel::Coarse,
        ResolutionLevel::Medium,
        ResolutionLevel::Fine,
    ];

    /// The H3 resolution backing this level.
    pub fn h3_level(self) -> u8 {
        match self {
            ResolutionLevel::Coarse => 3,
            ResolutionLevel::Medium => 4,
            ResolutionLevel::Fine => 5,
        }
    }

    /// Pick the level to render at a given web-map zoom.
    pub fn for_zoom(zoom: u8) -> Self {
        match zoom {
            0..=4 => ResolutionLevel::Coarse,
            5..=7 => ResolutionLevel::Medium,
            _ => ResolutionLevel::Fine,
        }
    }
}

impl std::fmt::Display for ResolutionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResolutionLevel::Coarse => "coarse",
            ResolutionLevel::Medium => "medium",
            ResolutionLevel::Fine => "fine",
        };
        write!(f, "{name} ({})", self.h3_level())
    }
}

// -------------------------------------------------------------------------------------------------
// Defaults
// -------------------------------------------------------------------------------------------------

/// Number of raw samples kept per CUSUM channel.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// CUSUM decision interval `h`; the reference value is `h / 2`.
pub const DEFAULT_DECISION_INTERVAL: f64 = 1.0;

/// Maximum number of waypoints retained per trajectory.
pub const DEFAULT_MAX_WAYPOINTS: usize = 500;

/// Inactivity period after which a trajectory is swept, in days.
pub const DEFAULT_INACTIVITY_DAYS: f64 = 7.0;

/// Flow edges with a count strictly below this are "low traffic" and may be cleaned up.
pub const DEFAULT_LOW_TRAFFIC_THRESHOLD: u64 = 2;

/// Hard cap on the number of flows returned by a single query.
pub const MAX_FLOW_RESULTS: usize = 10_000;

/// Proximity radius of the bundling graph, in degrees (4-D distance between quadruples).
pub const DEFAULT_PROXIMITY_RADIUS: Degree = 0.05;

/// Maximum number of spatial neighbors linked to one proximity node.
pub const DEFAULT_PROXIMITY_K: usize = 8;

/// Golden-section search stops once the bracket is narrower than this.
pub const GOLDEN_TOLERANCE: f64 = 1e-5;

/// Golden-section iteration bound (the bracket shrinks by ~0.618 per step).
pub const GOLDEN_MAX_ITER: usize = 100;

/// Upper bound on bundling passes.
pub const DEFAULT_MAX_PASSES: usize = 64;
