//! Ink cost model.
//!
//! The ink of a drawing is its total geodesic length. A bundle of segments drawn through two
//! control points `m1`, `m2` costs
//!
//! ```text
//! Σ ink(start_i → m1) + ink(m1 → m2) + Σ ink(m2 → end_i)
//! ```
//!
//! The control points lie on the line from the start centroid `S` to the end centroid `E`:
//! `m1 = S + (x/2)(E − S)` and `m2 = S + (1 − x/2)(E − S)`, with `x ∈ [0, 1]` chosen by
//! golden-section search. `x = 0` puts `m1`, `m2` on the centroids; `x = 1` collapses both onto
//! the midpoint.
use nalgebra::Vector2;

use crate::bundling::golden_section::golden_section_search;
use crate::constants::{LonLat, Meter, Quad};
use crate::geodesy::{distance, ink, lerp};
use crate::graph::proximity::ProximityNode;

/// Result of the control point search for one candidate bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BundleFit {
    pub x: f64,
    pub m1: LonLat,
    pub m2: LonLat,
    pub ink: Meter,
}

/// Start and end centroids of a set of segments, as `[lon, lat]`.
///
/// Return
/// ----------
/// * `None` for an empty set.
pub fn centroids(segments: &[Quad]) -> Option<(LonLat, LonLat)> {
    if segments.is_empty() {
        return None;
    }
    let (start, end) = segments.iter().fold(
        (Vector2::<f64>::zeros(), Vector2::<f64>::zeros()),
        |(s, e), q| (s + Vector2::new(q[0], q[1]), e + Vector2::new(q[2], q[3])),
    );
    let n = segments.len() as f64;
    let (start, end) = (start / n, end / n);
    Some(([start.x, start.y], [end.x, end.y]))
}

/// Direct ink: every segment drawn on its own.
pub fn direct_ink(segments: &[Quad]) -> Meter {
    segments.iter().map(ink).sum()
}

/// Ink of `segments` drawn through `m1` and `m2`.
pub fn bundled_ink(segments: &[Quad], m1: LonLat, m2: LonLat) -> Meter {
    let fan: Meter = segments
        .iter()
        .map(|q| distance([q[0], q[1]], m1) + distance(m2, [q[2], q[3]]))
        .sum();
    fan + distance(m1, m2)
}

/// Control points at parameter `x` between the centroids.
#[inline]
pub fn control_points(start: LonLat, end: LonLat, x: f64) -> (LonLat, LonLat) {
    (lerp(start, end, x / 2.0), lerp(start, end, 1.0 - x / 2.0))
}

/// Best control points for bundling `segments` together.
///
/// Arguments
/// -----------------
/// * `segments`: the union of the candidate nodes' segments.
/// * `tolerance`, `max_iter`: golden-section search settings.
///
/// Return
/// ----------
/// * `None` for an empty set.
pub fn best_bundle(segments: &[Quad], tolerance: f64, max_iter: usize) -> Option<BundleFit> {
    let (start, end) = centroids(segments)?;
    let cost = |x: f64| {
        let (m1, m2) = control_points(start, end, x);
        bundled_ink(segments, m1, m2)
    };
    let x = golden_section_search(cost, 0.0, 1.0, tolerance, max_iter);
    let (m1, m2) = control_points(start, end, x);
    Some(BundleFit {
        x,
        m1,
        m2,
        ink: bundled_ink(segments, m1, m2),
    })
}

/// Current ink of a node: bundled through its control points if it has some, direct otherwise.
pub fn node_ink(node: &ProximityNode) -> Meter {
    match node.control_points {
        Some((m1, m2)) => bundled_ink(&node.segments, m1, m2),
        None => direct_ink(&node.segments),
    }
}
