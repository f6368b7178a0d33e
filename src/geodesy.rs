//! # Great-circle geometry on a spherical Earth
//!
//! Helpers behind the edge bundler's *ink* cost and report validation. All public functions
//! take **degrees** in `[lon, lat]` order and return **meters**.
//!
//! The central angle uses the haversine form
//!
//! ```text
//! hav(θ) = hav(Δφ) + (1 − hav(Δφ) − hav(φ1 + φ2)) · hav(Δλ)
//! θ      = archav(...) = 2 · asin(√...)
//! ```
//!
//! which stays well conditioned for very short segments.

use crate::constants::{Degree, LonLat, Meter, Quad, Radian, EARTH_MAJOR_AXIS};

/// Haversine: `sin²(x / 2)`.
#[inline]
pub fn hav(x: Radian) -> f64 {
    let s = (x / 2.0).sin();
    s * s
}

/// Inverse haversine, clamped so rounding noise above 1 does not produce `NaN`.
#[inline]
pub fn archav(h: f64) -> Radian {
    2.0 * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Central angle between two `[lon, lat]` points given in degrees.
///
/// Arguments
/// -----------------
/// * `a`, `b`: endpoints as `[lon, lat]` in **degrees**.
///
/// Return
/// ----------
/// * The central angle in **radians**, in `[0, π]`.
pub fn central_angle(a: LonLat, b: LonLat) -> Radian {
    let (lon1, lat1) = (a[0].to_radians(), a[1].to_radians());
    let (lon2, lat2) = (b[0].to_radians(), b[1].to_radians());

    let hav_lat = hav((lat1 - lat2).abs());
    let hav_lon = hav((lon1 - lon2).abs());
    let hav_sum = hav(lat1 + lat2);

    archav(hav_lat + (1.0 - hav_lat - hav_sum) * hav_lon)
}

/// Great-circle distance between two points, in meters.
#[inline]
pub fn distance(a: LonLat, b: LonLat) -> Meter {
    central_angle(a, b) * EARTH_MAJOR_AXIS
}

/// Ink of a directed segment `[x1, y1, x2, y2]`: its geodesic arc length in meters.
#[inline]
pub fn ink(segment: &Quad) -> Meter {
    distance([segment[0], segment[1]], [segment[2], segment[3]])
}

/// Point at fraction `t` of the straight (coordinate-space) line from `a` to `b`.
#[inline]
pub fn lerp(a: LonLat, b: LonLat, t: f64) -> LonLat {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// `true` when both components are finite and within the WGS84 ranges.
#[inline]
pub fn is_valid_lon_lat(lon: Degree, lat: Degree) -> bool {
    lon.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}
