//! Geographic value types: coordinates, viewport regions and bounding boxes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum valid WGS84 latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid WGS84 latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid WGS84 longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid WGS84 longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors raised when validating geographic input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid span: {0} (must be finite and non-negative)")]
    InvalidSpan(f64),
}

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without validation.
    ///
    /// Out-of-range input is a caller error; use [`Coordinate::try_new`] at
    /// trust boundaries.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting values outside the WGS84 ranges.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        let coord = Self::new(latitude, longitude);
        coord.validate()?;
        Ok(coord)
    }

    /// Check that both components are finite and inside the WGS84 ranges.
    pub fn validate(&self) -> Result<(), CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(CoordError::InvalidLatitude(self.latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(CoordError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// The rectangular area currently visible on the map.
///
/// A region is immutable; every map movement produces a new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRegion {
    center: Coordinate,
    latitude_span: f64,
    longitude_span: f64,
}

impl ViewportRegion {
    /// Create a region from its center and full latitude/longitude spans.
    pub const fn new(center: Coordinate, latitude_span: f64, longitude_span: f64) -> Self {
        Self {
            center,
            latitude_span,
            longitude_span,
        }
    }

    /// Create a region, validating the center and both spans.
    pub fn try_new(
        center: Coordinate,
        latitude_span: f64,
        longitude_span: f64,
    ) -> Result<Self, CoordError> {
        center.validate()?;
        for span in [latitude_span, longitude_span] {
            if !span.is_finite() || span < 0.0 {
                return Err(CoordError::InvalidSpan(span));
            }
        }
        Ok(Self::new(center, latitude_span, longitude_span))
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    pub fn latitude_span(&self) -> f64 {
        self.latitude_span
    }

    pub fn longitude_span(&self) -> f64 {
        self.longitude_span
    }

    /// The bounding rectangle covered by this region.
    pub fn bounds(&self) -> GeoBounds {
        let half_lat = self.latitude_span / 2.0;
        let half_lon = self.longitude_span / 2.0;
        GeoBounds {
            min_lat: self.center.latitude - half_lat,
            max_lat: self.center.latitude + half_lat,
            min_lon: self.center.longitude - half_lon,
            max_lon: self.center.longitude + half_lon,
        }
    }

    /// Whether `coord` lies inside this region's rectangle (inclusive).
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.bounds().contains(coord)
    }
}

/// An axis-aligned latitude/longitude rectangle.
///
/// Bounds are not wrapped at the antimeridian: a rectangle whose longitude
/// range leaves [-180, 180] only matches points inside the unwrapped range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Inclusive containment test.
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.latitude >= self.min_lat
            && coord.latitude <= self.max_lat
            && coord.longitude >= self.min_lon
            && coord.longitude <= self.max_lon
    }
}
