//! Geographic primitives: validated coordinates, great-circle distance,
//! and the safe-zone membership test.
//!
//! Validation happens once, in [`Coordinates::new`] (and during
//! deserialization), so the distance math operates on an always-valid type
//! and has no failure modes of its own.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in meters, spherical approximation.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A validated latitude/longitude pair in degrees.
///
/// Latitude is restricted to [-90, 90] and longitude to [-180, 180]; both
/// components are finite. Construction and deserialization enforce the
/// range, so holders of a `Coordinates` value never re-validate.
///
/// # Examples
///
/// ```
/// use faro_core::geo::Coordinates;
///
/// let madrid = Coordinates::new(40.4168, -3.7038).unwrap();
/// assert_eq!(madrid.latitude(), 40.4168);
///
/// assert!(Coordinates::new(91.0, 0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

/// Unvalidated mirror of [`Coordinates`] used by serde.
#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = Error;

    fn try_from(raw: RawCoordinates) -> Result<Self> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    /// Creates a validated coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinate`] if either component is
    /// non-finite or outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidCoordinate(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate(format!(
                "longitude {longitude} outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Computes the great-circle distance between two points in meters.
///
/// Uses the haversine formula on a spherical Earth
/// ([`EARTH_RADIUS_METERS`]). Good to ~0.5% against the true ellipsoid,
/// which is far below GPS accuracy at safe-zone scales.
///
/// # Examples
///
/// ```
/// use faro_core::geo::{distance_meters, Coordinates};
///
/// let home = Coordinates::new(40.4168, -3.7038).unwrap();
/// let north = Coordinates::new(40.4218, -3.7038).unwrap();
///
/// let d = distance_meters(home, north);
/// assert!((d - 556.0).abs() < 5.0); // ~556 m due north
/// ```
#[must_use]
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Returns whether `point` lies strictly outside the circular safe zone
/// centered on `home` with the given radius in meters.
///
/// A point exactly on the boundary counts as inside.
#[must_use]
pub fn is_outside_safe_zone(point: Coordinates, home: Coordinates, radius_meters: f64) -> bool {
    distance_meters(point, home) > radius_meters
}
