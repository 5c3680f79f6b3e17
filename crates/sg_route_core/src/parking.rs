use chrono::{Duration, NaiveDateTime};
use std::collections::HashMap;

use crate::error::EngineResult;
use crate::geocode::{GeoPoint, Geocoder, geocode_first};
use crate::model::CarparkAvailability;
use crate::signals::timestamp::{is_recent, parse_store_timestamp, window_start};
use crate::store::SignalStore;

/// Parse a car park `location` field ("lat lon", space separated).
pub fn parse_location(raw: &str) -> Option<GeoPoint> {
    let mut parts = raw.split_whitespace();
    let lat = parts.next()?.parse::<f64>().ok()?;
    let lon = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    Some(GeoPoint::new(lat, lon))
}

/// Finds the car parks nearest to a destination with current availability.
pub struct ParkingProximityResolver<'a, S: SignalStore + ?Sized, G: Geocoder + ?Sized> {
    store: &'a S,
    geocoder: &'a G,
    window: Duration,
    nearest: usize,
}

impl<'a, S, G> ParkingProximityResolver<'a, S, G>
where
    S: SignalStore + ?Sized,
    G: Geocoder + ?Sized,
{
    pub fn new(store: &'a S, geocoder: &'a G, window: Duration, nearest: usize) -> Self {
        Self {
            store,
            geocoder,
            window,
            nearest,
        }
    }

    /// Geocode `destination` and return its nearest car parks, closest first.
    /// An empty list means no fresh parking data, not an error.
    pub fn resolve(&self, destination: &str, now: NaiveDateTime) -> EngineResult<Vec<CarparkAvailability>> {
        let point = geocode_first(self.geocoder, destination)?;
        self.nearest_to(point, now)
    }

    /// Nearest fresh car parks around an already resolved point.
    pub fn nearest_to(&self, point: GeoPoint, now: NaiveDateTime) -> EngineResult<Vec<CarparkAvailability>> {
        let since = window_start(now, self.window);
        let rows = self.store.carparks_since(since)?;

        // Repeated snapshots list the same car park several times; keep the
        // newest reading of each.
        let mut latest: Vec<(NaiveDateTime, f64, CarparkAvailability)> = Vec::new();
        let mut by_key: HashMap<(String, String), usize> = HashMap::new();

        for row in rows {
            let taken_at = match parse_store_timestamp(&row.timestamp) {
                Ok(t) if is_recent(t, since) => t,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("dropping car park '{}': {e}", row.development);
                    continue;
                }
            };

            let Some(location) = parse_location(&row.location) else {
                tracing::debug!(
                    "dropping car park '{}': unreadable location '{}'",
                    row.development,
                    row.location
                );
                continue;
            };

            let key = (row.development.trim().to_string(), row.location.trim().to_string());
            let cp = match CarparkAvailability::new(row.development, row.available_lots) {
                Ok(cp) => cp,
                Err(e) => {
                    tracing::debug!("dropping car park row: {e}");
                    continue;
                }
            };
            let distance = location.planar_distance(&point);

            match by_key.get(&key) {
                Some(&i) if latest[i].0 <= taken_at => latest[i] = (taken_at, distance, cp),
                Some(_) => {}
                None => {
                    by_key.insert(key, latest.len());
                    latest.push((taken_at, distance, cp));
                }
            }
        }

        let mut ranked: Vec<(f64, CarparkAvailability)> =
            latest.into_iter().map(|(_, d, cp)| (d, cp)).collect();

        // Stable: equidistant car parks keep store order.
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(ranked
            .into_iter()
            .take(self.nearest)
            .map(|(_, cp)| cp)
            .collect())
    }
}
