//! Geodesic primitives shared by the pipeline stages.
//!
//! Distances and bearings are great-circle values from the `geo` crate.
//! Deviation from a line uses a local equirectangular projection, which
//! is accurate to well under a millimetre at the scale of a single
//! simplification run.

use geo::line_measures::{Bearing, Destination, Distance};
use geo::{Haversine, Point};

use crate::types::Coordinate;

/// Mean earth radius in metres, the same sphere `geo::Haversine` uses.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

// ---------------------------------------------------------------------------
// Type conversions at the module boundary
// ---------------------------------------------------------------------------

/// Convert a pipeline `Coordinate` to a `geo::Point` (x = lon, y = lat).
const fn to_point(c: Coordinate) -> Point<f64> {
    Point(geo::Coord { x: c.lon, y: c.lat })
}

/// Great-circle distance between two coordinates in metres.
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    Haversine.distance(to_point(a), to_point(b))
}

/// Initial great-circle bearing from `a` to `b` in degrees, `[0, 360)`.
#[must_use]
pub fn bearing(a: Coordinate, b: Coordinate) -> f64 {
    let deg = Haversine.bearing(to_point(a), to_point(b)).rem_euclid(360.0);
    // rem_euclid can round tiny negative inputs up to exactly 360.
    if deg >= 360.0 { 0.0 } else { deg }
}

/// The coordinate reached from `origin` after `distance_m` metres on
/// initial bearing `bearing_deg`. Elevation is not carried over.
#[must_use]
pub fn destination(origin: Coordinate, bearing_deg: f64, distance_m: f64) -> Coordinate {
    let p = Haversine.destination(to_point(origin), bearing_deg, distance_m);
    Coordinate::new(p.y(), p.x())
}

/// Normalize a heading change into `[-180, 180)` degrees.
#[must_use]
pub fn normalize_delta(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Signed heading change from orientation `from` to orientation `to`.
///
/// Positive values turn clockwise (right), negative counter-clockwise.
#[must_use]
pub fn heading_change(from: f64, to: f64) -> f64 {
    normalize_delta(to - from)
}

/// Distance in metres of `p` from the chord between `a` and `b`.
///
/// Points that project beyond either end of the chord are measured to
/// that endpoint, so a path that doubles back on itself is never
/// considered close to its own chord. When `a` and `b` coincide, returns
/// the distance from `p` to `a`.
#[must_use]
pub fn deviation(p: Coordinate, a: Coordinate, b: Coordinate) -> f64 {
    let (bx, by) = project(b, a);
    let (px, py) = project(p, a);
    let length_sq = bx.mul_add(bx, by * by);

    if length_sq == 0.0 {
        return px.hypot(py);
    }

    // Position of the foot of the perpendicular along a -> b, with a at
    // the origin.
    let t = (px.mul_add(bx, py * by) / length_sq).clamp(0.0, 1.0);
    t.mul_add(-bx, px).hypot(t.mul_add(-by, py))
}

/// Project `c` onto a local plane in metres centred on `origin`.
fn project(c: Coordinate, origin: Coordinate) -> (f64, f64) {
    let cos_lat = origin.lat.to_radians().cos();
    let x = normalize_delta(c.lon - origin.lon).to_radians() * cos_lat * EARTH_RADIUS_M;
    let y = (c.lat - origin.lat).to_radians() * EARTH_RADIUS_M;
    (x, y)
}
