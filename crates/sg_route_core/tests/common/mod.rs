#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};
use std::cell::Cell;
use std::collections::HashMap;

use sg_route_core::db::SqliteStore;
use sg_route_core::error::{EngineError, EngineResult};
use sg_route_core::geocode::{GeoPoint, Geocoder};
use sg_route_core::model::RouteCandidate;
use sg_route_core::signals::timestamp::format_store_timestamp;

/// Fixed evaluation clock: 2024-03-05 08:30.
pub fn now() -> NaiveDateTime {
    at(2024, 3, 5, 8, 30)
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|d| d.and_hms_opt(h, min, 0))
        .expect("valid test datetime")
}

pub fn minutes_ago(n: i64) -> NaiveDateTime {
    now() - chrono::Duration::minutes(n)
}

/// Incident message token for `t`, e.g. "(05/03)08:10".
pub fn stamp(t: NaiveDateTime) -> String {
    t.format("(%d/%m)%H:%M").to_string()
}

pub fn memory_store() -> SqliteStore {
    let con = Connection::open_in_memory().expect("in-memory sqlite");
    SqliteStore::from_connection(con).expect("migrated store")
}

pub fn add_incident(store: &SqliteStore, kind: &str, event_at: NaiveDateTime, text: &str, snapshot: NaiveDateTime) {
    store
        .connection()
        .execute(
            "INSERT INTO trafficincidents(type, latitude, longitude, message, timestamp) VALUES (?1, 1.3, 103.8, ?2, ?3)",
            params![kind, format!("{} {}", stamp(event_at), text), format_store_timestamp(snapshot)],
        )
        .expect("insert incident");
}

pub fn add_roadwork(store: &SqliteStore, road: &str, start: &str, end: &str, snapshot: NaiveDateTime) {
    store
        .connection()
        .execute(
            "INSERT INTO roadworks(eventid, startdate, enddate, svcdept, roadname, other, timestamp) VALUES ('RW1', ?1, ?2, 'LTA', ?3, NULL, ?4)",
            params![start, end, road, format_store_timestamp(snapshot)],
        )
        .expect("insert road work");
}

pub fn add_carpark(store: &SqliteStore, development: &str, lat: f64, lon: f64, lots: i64, snapshot: NaiveDateTime) {
    store
        .connection()
        .execute(
            "INSERT INTO carpark(carparkid, area, development, location, availablelots, lottype, agency, timestamp) VALUES ('1', 'Marina', ?1, ?2, ?3, 'C', 'LTA', ?4)",
            params![development, format!("{lat} {lon}"), lots, format_store_timestamp(snapshot)],
        )
        .expect("insert car park");
}

/// Geocoder answering from a fixed table; unknown addresses have no match.
#[derive(Default)]
pub struct FakeGeocoder {
    places: HashMap<String, Vec<GeoPoint>>,
    pub calls: Cell<usize>,
}

impl FakeGeocoder {
    pub fn with(mut self, address: &str, points: &[(f64, f64)]) -> Self {
        self.places.insert(
            address.to_string(),
            points.iter().map(|&(lat, lon)| GeoPoint::new(lat, lon)).collect(),
        );
        self
    }
}

impl Geocoder for FakeGeocoder {
    fn search(&self, address: &str) -> EngineResult<Vec<GeoPoint>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.places.get(address).cloned().unwrap_or_default())
    }
}

/// Geocoder whose service is always down.
pub struct DownGeocoder;

impl Geocoder for DownGeocoder {
    fn search(&self, address: &str) -> EngineResult<Vec<GeoPoint>> {
        Err(EngineError::GeocoderUnavailable {
            address: address.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

pub fn private_route(index: usize, roads: &[&str], destination: &str, minutes: f64) -> RouteCandidate {
    RouteCandidate::new(
        index,
        roads.iter().map(|r| r.to_string()).collect(),
        destination,
        false,
        minutes,
        10.0,
    )
    .expect("valid candidate")
}

pub fn public_route(index: usize, roads: &[&str], destination: &str, minutes: f64) -> RouteCandidate {
    RouteCandidate::new(
        index,
        roads.iter().map(|r| r.to_string()).collect(),
        destination,
        true,
        minutes,
        10.0,
    )
    .expect("valid candidate")
}
