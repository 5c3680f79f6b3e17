use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::geocode::{GeoPoint, Geocoder};

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub found: i64,

    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "SEARCHVAL", default)]
    pub search_val: Option<String>,

    // OneMap returns coordinates as strings
    #[serde(rename = "LATITUDE")]
    pub latitude: String,

    #[serde(rename = "LONGITUDE")]
    pub longitude: String,
}

impl SearchResponse {
    /// Candidates in service order; entries with unreadable coordinates are
    /// skipped.
    pub fn points(&self) -> Vec<GeoPoint> {
        self.results
            .iter()
            .filter_map(|r| {
                let lat = r.latitude.trim().parse::<f64>().ok()?;
                let lon = r.longitude.trim().parse::<f64>().ok()?;
                (lat.is_finite() && lon.is_finite()).then_some(GeoPoint::new(lat, lon))
            })
            .collect()
    }
}

/// Geocoder backed by the OneMap elastic search endpoint.
pub struct OneMapGeocoder {
    client: Client,
    url: String,
}

impl OneMapGeocoder {
    pub fn new(url: impl Into<String>, timeout: Duration) -> EngineResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::InvalidConfig(format!("Unable to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    fn unavailable(address: &str, reason: impl std::fmt::Display) -> EngineError {
        EngineError::GeocoderUnavailable {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Geocoder for OneMapGeocoder {
    fn search(&self, address: &str) -> EngineResult<Vec<GeoPoint>> {
        let resp: SearchResponse = self
            .client
            .get(&self.url)
            .query(&[
                ("searchVal", address),
                ("returnGeom", "Y"),
                ("getAddrDetails", "N"),
                ("pageNum", "1"),
            ])
            .send()
            .map_err(|e| Self::unavailable(address, e))?
            .error_for_status()
            .map_err(|e| Self::unavailable(address, e))?
            .json()
            .map_err(|e| Self::unavailable(address, format!("unreadable response: {e}")))?;

        tracing::debug!("OneMap: {} result(s) for '{}'", resp.found, address);
        Ok(resp.points())
    }
}
