use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::directions::{parse_distance_km, parse_duration_minutes, parse_option_line};
use crate::error::{EngineError, EngineResult};
use crate::normalize::normalize_text;

/// Sentinel for an unknown travel time. Always >= any `max_time_min`, so the
/// time score degrades to 0 instead of failing.
pub const UNKNOWN_TRAVEL_TIME_MIN: f64 = f64::INFINITY;

/// One proposed way to travel to the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCandidate {
    index: usize,
    roads: Vec<String>,
    destination: String,
    is_public_transport: bool,
    travel_time_min: f64,
    distance_km: f64,
}

impl RouteCandidate {
    pub fn new(
        index: usize,
        roads: Vec<String>,
        destination: impl Into<String>,
        is_public_transport: bool,
        travel_time_min: f64,
        distance_km: f64,
    ) -> EngineResult<Self> {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(EngineError::InvalidCandidate(format!(
                "route {index}: destination must be non-empty"
            )));
        }

        // NaN and negatives are rejected; +inf is the unknown-time sentinel.
        if travel_time_min.is_nan() || travel_time_min < 0.0 {
            return Err(EngineError::InvalidCandidate(format!(
                "route {index}: travel time must be >= 0 minutes (got {travel_time_min})"
            )));
        }
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(EngineError::InvalidCandidate(format!(
                "route {index}: distance must be a finite value >= 0 km (got {distance_km})"
            )));
        }

        let mut cleaned = Vec::with_capacity(roads.len());
        for road in roads {
            let road = road.trim().to_string();
            if normalize_text(&road).is_empty() {
                return Err(EngineError::InvalidCandidate(format!(
                    "route {index}: road names must contain at least one letter or digit"
                )));
            }
            cleaned.push(road);
        }

        Ok(Self {
            index,
            roads: cleaned,
            destination,
            is_public_transport,
            travel_time_min,
            distance_km,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn roads(&self) -> &[String] {
        &self.roads
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn is_public_transport(&self) -> bool {
        self.is_public_transport
    }

    pub fn travel_time_min(&self) -> f64 {
        self.travel_time_min
    }

    pub fn has_known_travel_time(&self) -> bool {
        self.travel_time_min.is_finite()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_km
    }
}

/// Wire shape of a candidate as produced by the routing connector.
///
/// Time and distance may arrive as numbers or as Directions-style text
/// ("1 hour 5 mins", "12.4 km").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteCandidateInput {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub roads: Vec<String>,
    pub destination: String,
    pub is_public_transport: bool,
    #[serde(default)]
    pub travel_time_min: Option<f64>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub distance: Option<String>,
    /// Route finder header, e.g. "Option 2 takes 35 mins and is 12.3 km long!".
    /// Fills whatever the fields above leave out.
    #[serde(default)]
    pub summary: Option<String>,
}

impl RouteCandidateInput {
    /// Validate into a candidate; `position` is used when no explicit index
    /// was supplied.
    pub fn into_candidate(self, position: usize) -> EngineResult<RouteCandidate> {
        let header = match self.summary.as_deref() {
            Some(line) => Some(parse_option_line(line).ok_or_else(|| {
                EngineError::InvalidCandidate(format!(
                    "route {}: unrecognised summary '{line}'",
                    self.index.unwrap_or(position)
                ))
            })?),
            None => None,
        };
        let index = self.index.or(header.map(|h| h.option)).unwrap_or(position);

        let travel_time_min = match (self.travel_time_min, self.duration.as_deref(), header) {
            (Some(t), _, _) => t,
            (None, Some(text), _) => parse_duration_minutes(text).ok_or_else(|| {
                EngineError::InvalidCandidate(format!(
                    "route {index}: unrecognised duration '{text}'"
                ))
            })?,
            (None, None, Some(h)) => h.travel_time_min,
            (None, None, None) => UNKNOWN_TRAVEL_TIME_MIN,
        };

        let distance_km = match (self.distance_km, self.distance.as_deref(), header) {
            (Some(d), _, _) => d,
            (None, Some(text), _) => parse_distance_km(text).ok_or_else(|| {
                EngineError::InvalidCandidate(format!(
                    "route {index}: unrecognised distance '{text}'"
                ))
            })?,
            (None, None, Some(h)) => h.distance_km,
            (None, None, None) => 0.0,
        };

        RouteCandidate::new(
            index,
            self.roads,
            self.destination,
            self.is_public_transport,
            travel_time_min,
            distance_km,
        )
    }
}

/// Parse a JSON array of candidates, validating each one. Candidates without
/// an explicit index are numbered from 1 in list order.
pub fn candidates_from_json(json: &str) -> EngineResult<Vec<RouteCandidate>> {
    let inputs: Vec<RouteCandidateInput> = serde_json::from_str(json)
        .map_err(|e| EngineError::InvalidInput(format!("route candidates JSON: {e}")))?;

    inputs
        .into_iter()
        .enumerate()
        .map(|(pos, input)| input.into_candidate(pos + 1))
        .collect()
}

/// Active signal counts for a single road.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadSignal {
    pub incidents: u32,
    pub roadworks: u32,
    pub breakdowns: u32,
}

impl RoadSignal {
    pub fn new(incidents: u32, roadworks: u32, breakdowns: u32) -> Self {
        Self {
            incidents,
            roadworks,
            breakdowns,
        }
    }

    pub fn is_clear(&self) -> bool {
        self.incidents == 0 && self.roadworks == 0 && self.breakdowns == 0
    }
}

/// Signals for every road of a route, keyed by road name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoadSignals(BTreeMap<String, RoadSignal>);

impl RoadSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, road: impl Into<String>, signal: RoadSignal) {
        self.0.insert(road.into(), signal);
    }

    pub fn get(&self, road: &str) -> Option<&RoadSignal> {
        self.0.get(road)
    }

    pub(crate) fn get_mut(&mut self, road: &str) -> Option<&mut RoadSignal> {
        self.0.get_mut(road)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RoadSignal)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, RoadSignal)> for RoadSignals {
    fn from_iter<I: IntoIterator<Item = (String, RoadSignal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Current availability at one car park near the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarparkAvailability {
    development: String,
    available_lots: u32,
}

impl CarparkAvailability {
    pub fn new(development: impl Into<String>, available_lots: i64) -> EngineResult<Self> {
        let development = development.into().trim().to_string();
        if development.is_empty() {
            return Err(EngineError::InvalidInput(
                "car park development name must be non-empty".to_string(),
            ));
        }
        let available_lots = u32::try_from(available_lots).map_err(|_| {
            EngineError::InvalidInput(format!(
                "car park '{development}': available lots out of range ({available_lots})"
            ))
        })?;
        Ok(Self {
            development,
            available_lots,
        })
    }

    pub fn development(&self) -> &str {
        &self.development
    }

    pub fn available_lots(&self) -> u32 {
        self.available_lots
    }
}

/// Final desirability of a candidate, the unit the ranker works on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteScore {
    pub score: f64,
    pub is_public_transport: bool,
}
