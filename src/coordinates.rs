use serde::{Deserialize, Serialize};

/// Mean Earth radius used for great-circle distances.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct Coordinate {
  #[serde(alias = "latitude")]
  pub lat: f64,
  #[serde(alias = "longitude")]
  pub lon: f64,
}

impl Coordinate {
  #[must_use]
  pub fn new(lat: f64, lon: f64) -> Self {
    Self { lat, lon }
  }

  /// Builds a coordinate only from finite, in-range components.
  /// Degenerate readings (NaN, infinities, out of range) yield `None`.
  #[must_use]
  pub fn checked(lat: f64, lon: f64) -> Option<Self> {
    let coord = Self { lat, lon };
    coord.is_valid().then_some(coord)
  }

  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.lat.is_finite()
      && self.lon.is_finite()
      && (-90.0..=90.0).contains(&self.lat)
      && (-180.0..=180.0).contains(&self.lon)
  }
}

/// Haversine distance between two coordinates in kilometers.
///
/// Both points are supplied by the caller; there is no fixed-origin variant.
#[must_use]
pub fn distance_in_km(from: Coordinate, to: Coordinate) -> f64 {
  let d_lat = (to.lat - from.lat).to_radians();
  let d_lon = (to.lon - from.lon).to_radians();
  let a = f64::sin(d_lat / 2.0) * f64::sin(d_lat / 2.0)
    + f64::cos(from.lat.to_radians())
      * f64::cos(to.lat.to_radians())
      * f64::sin(d_lon / 2.0)
      * f64::sin(d_lon / 2.0);
  let c = 2.0 * f64::atan2(a.sqrt(), (1.0 - a).sqrt());
  EARTH_RADIUS_KM * c
}
