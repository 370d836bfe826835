use crate::coordinates::Coordinate;
use thiserror::Error;

/// Fallback position used whenever no live reading is available.
pub const DEFAULT_POSITION: Coordinate = Coordinate {
  lat: 11.5742,
  lon: 37.3614,
};

/// Failure modes of a position read, with the messages shown to users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
  #[error("Permission denied. Please allow location access.")]
  PermissionDenied,
  #[error("Location unavailable. Please check your device settings.")]
  Unavailable,
  #[error("Location request timed out.")]
  Timeout,
  #[error("Geolocation is not supported by this device.")]
  Unsupported,
  #[error("An unknown error occurred.")]
  Unknown,
}

/// The platform location seam. Implementations perform a single position
/// read; polling and retries are the caller's business.
#[async_trait::async_trait]
pub trait PositionSource: Send + Sync {
  /// Whether the host can deliver a position at all. Unsupported sources
  /// are never queried.
  fn is_supported(&self) -> bool {
    true
  }

  async fn current_position(&self) -> Result<Coordinate, PositionError>;
}

/// The outcome of a one-shot position read.
///
/// `latitude`/`longitude` are populated together or not at all; `error`
/// holds the user-facing message when they are absent.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFix {
  pub latitude: Option<f64>,
  pub longitude: Option<f64>,
  pub error: Option<String>,
}

impl GeoFix {
  fn from_reading(coord: Coordinate) -> Self {
    Self {
      latitude: Some(coord.lat),
      longitude: Some(coord.lon),
      error: None,
    }
  }

  fn from_error(error: &PositionError) -> Self {
    Self {
      latitude: None,
      longitude: None,
      error: Some(error.to_string()),
    }
  }

  /// The concrete pair every consumer works with: the fix's own reading
  /// when present, [`DEFAULT_POSITION`] otherwise. This is the only place
  /// the fallback rule lives.
  #[must_use]
  pub fn coordinate(&self) -> Coordinate {
    match (self.latitude, self.longitude) {
      (Some(lat), Some(lon)) => Coordinate { lat, lon },
      _ => DEFAULT_POSITION,
    }
  }

  #[must_use]
  pub fn is_live(&self) -> bool {
    self.latitude.is_some() && self.longitude.is_some()
  }
}

/// Performs exactly one read attempt against the source and never fails;
/// every error is folded into the fix. A reading with degenerate components
/// counts as [`PositionError::Unavailable`] and is not promoted.
pub async fn resolve(source: &dyn PositionSource) -> GeoFix {
  if !source.is_supported() {
    return GeoFix::from_error(&PositionError::Unsupported);
  }

  match source.current_position().await {
    Ok(coord) => match Coordinate::checked(coord.lat, coord.lon) {
      Some(valid) => {
        log::debug!("position reading: {:.4}, {:.4}", valid.lat, valid.lon);
        GeoFix::from_reading(valid)
      }
      None => {
        log::warn!("discarding degenerate position reading: {coord:?}");
        GeoFix::from_error(&PositionError::Unavailable)
      }
    },
    Err(e) => {
      log::warn!("position read failed: {e}");
      GeoFix::from_error(&e)
    }
  }
}
