pub mod onemap;

use serde::Serialize;

use crate::error::{EngineError, EngineResult};

pub use onemap::OneMapGeocoder;

/// WGS84 coordinates as returned by the geocoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Plane distance in degrees. Good enough for ranking car parks within
    /// one city.
    pub fn planar_distance(&self, other: &GeoPoint) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

/// Geocoding collaborator: free-text address to zero or more candidates,
/// best match first.
pub trait Geocoder {
    fn search(&self, address: &str) -> EngineResult<Vec<GeoPoint>>;
}

/// Resolve `address` to a single point. When several places match, the
/// first candidate wins; no disambiguation is attempted.
pub fn geocode_first<G: Geocoder + ?Sized>(geocoder: &G, address: &str) -> EngineResult<GeoPoint> {
    let candidates = geocoder.search(address)?;

    if candidates.len() > 1 {
        tracing::debug!(
            "{} places match '{}', using the first one",
            candidates.len(),
            address
        );
    }

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::AddressNotFound {
            address: address.to_string(),
        })
}
