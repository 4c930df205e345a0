//! Geographic math.
//!
//! Provides the value types the feed works with ([`Coordinate`],
//! [`ViewportRegion`], [`GeoBounds`]) and great-circle distance using the
//! haversine formula.

mod types;

pub use types::{
    CoordError, Coordinate, GeoBounds, ViewportRegion, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON,
};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
///
/// Symmetric, and zero for identical points.
#[inline]
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push near-antipodal points marginally above 1.
    let h = h.min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Bounding rectangle enclosing a circle of `radius_km` around `center`.
///
/// Used to turn a radius query into a rectangle query; callers still filter
/// the rectangle's corners out with [`distance_km`]. Latitudes are clamped to
/// the poles and the longitude range widens to the full circle near them.
pub fn bounds_around(center: Coordinate, radius_km: f64) -> GeoBounds {
    let dlat = (radius_km / EARTH_RADIUS_KM).to_degrees();
    let min_lat = (center.latitude - dlat).max(MIN_LAT);
    let max_lat = (center.latitude + dlat).min(MAX_LAT);

    let cos_lat = center.latitude.to_radians().cos();
    let (min_lon, max_lon) = if min_lat <= MIN_LAT || max_lat >= MAX_LAT || cos_lat <= f64::EPSILON
    {
        (MIN_LON, MAX_LON)
    } else {
        let dlon = (dlat / cos_lat).min(180.0);
        (center.longitude - dlon, center.longitude + dlon)
    };

    GeoBounds {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    }
}
