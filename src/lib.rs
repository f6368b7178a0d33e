//! # ArgoAtlas
//!
//! Vessel traffic atlas built from AIS position reports:
//!
//! * [`trajectories`] – per-vessel CUSUM simplification of the report stream into waypoints.
//! * [`flows`] – counted cell-to-cell transitions on the H3 grid at three zoom levels.
//! * [`graph`] and [`bundling`] – proximity graph of path segments and ink-minimizing edge
//!   bundling for rendering.
//!
//! [`Atlas`] is the entry point: it ingests reports, answers map queries and runs the batch
//! operations that the [`scheduler`] triggers periodically.
pub mod atlas;
pub mod atlas_errors;
pub mod bundling;
pub mod constants;
pub mod flows;
pub mod geodesy;
pub mod graph;
pub mod params;
pub mod reports;
pub mod scheduler;
pub mod time;
pub mod trajectories;

pub use atlas::Atlas;
pub use atlas_errors::AtlasError;
pub use params::AtlasParams;
