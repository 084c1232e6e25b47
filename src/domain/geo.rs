//! Great-circle distance and zone membership
//!
//! All functions here are pure. Distances use the haversine formula on a
//! spherical Earth of mean radius 6,371 km, in `f64` throughout.

use super::types::{Point, Zone};

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine great-circle distance in metres.
///
/// The intermediate `a` term is clamped to `[0, 1]`: floating rounding can push
/// it just past 1 for antipodal points, which would make `sqrt(1 - a)` NaN.
pub fn distance_meters(p1: Point, p2: Point) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lon = (p2.lon - p1.lon).to_radians();

    let a = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    let a = a.clamp(0.0, 1.0);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Boundary inclusive: a point exactly `radius_meters` away is inside.
#[inline]
pub fn is_in_zone(point: Point, zone: &Zone) -> bool {
    distance_meters(point, zone.center) <= zone.radius_meters
}
