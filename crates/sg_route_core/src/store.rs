//! Read-only query contract the engine consumes from the signal store.
//!
//! Rows are returned raw: parsing of timestamps and locations happens in the
//! extractor and resolver so a malformed row only drops itself.

use chrono::NaiveDateTime;

use crate::error::EngineResult;

/// One row of the traffic incident feed.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRow {
    /// Feed category, e.g. "Accident", "Roadwork", "Vehicle breakdown".
    pub kind: String,
    /// `(DD/MM)HH:MM <text>`; the token is the event time.
    pub message: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Snapshot time of the import, if the feed recorded one.
    pub timestamp: Option<String>,
}

/// One row of the scheduled road works feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadworkRow {
    pub road_name: String,
    pub start_date: String,
    pub end_date: String,
    pub timestamp: String,
}

/// One row of the car park availability feed.
#[derive(Debug, Clone, PartialEq)]
pub struct CarparkRow {
    pub development: String,
    /// "lat lon", space separated.
    pub location: String,
    pub available_lots: i64,
    pub timestamp: String,
}

/// Data-store query collaborator.
///
/// Implementations must filter by recency (`timestamp >= since`) and must not
/// return rows older than `since`; the engine re-checks anyway.
pub trait SignalStore {
    fn incidents_since(&self, since: NaiveDateTime) -> EngineResult<Vec<IncidentRow>>;

    fn roadworks_since(&self, since: NaiveDateTime) -> EngineResult<Vec<RoadworkRow>>;

    fn carparks_since(&self, since: NaiveDateTime) -> EngineResult<Vec<CarparkRow>>;
}
