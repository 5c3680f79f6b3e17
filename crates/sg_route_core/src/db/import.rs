//! Load Datamall CSV snapshots into the signal store.
//!
//! Headers are matched case-insensitively, so both the downloader output
//! (`Type,Latitude,...`) and the lowercased table dumps are accepted.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use csv::StringRecord;
use rusqlite::{Connection, params};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;

use crate::parking::parse_location;
use crate::signals::timestamp::{format_store_timestamp, parse_feed_date, parse_store_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    #[default]
    Append,
    /// Drop existing rows of the table first.
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct IncidentCsv {
    #[serde(rename = "type")]
    kind: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    message: String,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RoadworkCsv {
    eventid: Option<String>,
    startdate: String,
    enddate: String,
    svcdept: Option<String>,
    roadname: String,
    other: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CarparkCsv {
    carparkid: Option<String>,
    area: Option<String>,
    development: String,
    location: String,
    availablelots: i64,
    lottype: Option<String>,
    agency: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Read every record, lowercasing headers; undecodable records are counted
/// and skipped.
fn read_records<T: DeserializeOwned, R: Read>(reader: R) -> Result<(Vec<T>, usize)> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: StringRecord = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    rdr.set_headers(headers.clone());

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("Failed to read CSV record {}", i + 1))?;
        match rec.deserialize::<T>(Some(&headers)) {
            Ok(v) => out.push(v),
            Err(e) => {
                tracing::debug!("skipping CSV record {}: {e}", i + 1);
                skipped += 1;
            }
        }
    }
    Ok((out, skipped))
}

/// Normalize an optional snapshot time to the storage format; blank means
/// "taken at import time". `None` if present but unparseable.
fn snapshot_time(raw: Option<&str>, imported_at: NaiveDateTime) -> Option<String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Some(format_store_timestamp(imported_at)),
        Some(s) => parse_store_timestamp(s).ok().map(format_store_timestamp),
    }
}

fn clear_if_replace(con: &Connection, table: &str, mode: ImportMode) -> Result<()> {
    if mode == ImportMode::Replace {
        con.execute(&format!("DELETE FROM {table}"), [])
            .with_context(|| format!("Failed to clear table: {table}"))?;
    }
    Ok(())
}

pub fn import_incidents_csv<R: Read>(
    con: &mut Connection,
    reader: R,
    imported_at: NaiveDateTime,
    mode: ImportMode,
) -> Result<ImportStats> {
    let (records, mut skipped) = read_records::<IncidentCsv, _>(reader)?;
    let mut inserted = 0usize;

    let tx = con.transaction().context("Failed to start import transaction")?;
    clear_if_replace(&tx, "trafficincidents", mode)?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO trafficincidents(type, latitude, longitude, message, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;
        for r in records {
            let Some(ts) = snapshot_time(r.timestamp.as_deref(), imported_at) else {
                skipped += 1;
                continue;
            };
            if r.message.trim().is_empty() {
                skipped += 1;
                continue;
            }
            stmt.execute(params![r.kind.trim(), r.latitude, r.longitude, r.message.trim(), ts])
                .context("Failed to insert traffic incident")?;
            inserted += 1;
        }
    }
    tx.commit().context("Failed to commit incident import")?;

    tracing::info!("imported {inserted} traffic incidents ({skipped} skipped)");
    Ok(ImportStats { inserted, skipped })
}

pub fn import_roadworks_csv<R: Read>(
    con: &mut Connection,
    reader: R,
    imported_at: NaiveDateTime,
    mode: ImportMode,
) -> Result<ImportStats> {
    let (records, mut skipped) = read_records::<RoadworkCsv, _>(reader)?;
    let mut inserted = 0usize;

    let tx = con.transaction().context("Failed to start import transaction")?;
    clear_if_replace(&tx, "roadworks", mode)?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO roadworks(eventid, startdate, enddate, svcdept, roadname, other, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;
        for r in records {
            let (Some(start), Some(end), Some(ts)) = (
                parse_feed_date(&r.startdate),
                parse_feed_date(&r.enddate),
                snapshot_time(r.timestamp.as_deref(), imported_at),
            ) else {
                skipped += 1;
                continue;
            };
            if r.roadname.trim().is_empty() || end < start {
                skipped += 1;
                continue;
            }
            stmt.execute(params![
                r.eventid,
                start.to_string(),
                end.to_string(),
                r.svcdept,
                r.roadname.trim(),
                r.other,
                ts
            ])
            .context("Failed to insert road work")?;
            inserted += 1;
        }
    }
    tx.commit().context("Failed to commit road works import")?;

    tracing::info!("imported {inserted} road works ({skipped} skipped)");
    Ok(ImportStats { inserted, skipped })
}

pub fn import_carparks_csv<R: Read>(
    con: &mut Connection,
    reader: R,
    imported_at: NaiveDateTime,
    mode: ImportMode,
) -> Result<ImportStats> {
    let (records, mut skipped) = read_records::<CarparkCsv, _>(reader)?;
    let mut inserted = 0usize;

    let tx = con.transaction().context("Failed to start import transaction")?;
    clear_if_replace(&tx, "carpark", mode)?;
    {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO carpark(carparkid, area, development, location, availablelots, lottype, agency, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;
        for r in records {
            let Some(ts) = snapshot_time(r.timestamp.as_deref(), imported_at) else {
                skipped += 1;
                continue;
            };
            if r.development.trim().is_empty()
                || r.availablelots < 0
                || parse_location(&r.location).is_none()
            {
                skipped += 1;
                continue;
            }
            stmt.execute(params![
                r.carparkid,
                r.area,
                r.development.trim(),
                r.location.trim(),
                r.availablelots,
                r.lottype,
                r.agency,
                ts
            ])
            .context("Failed to insert car park")?;
            inserted += 1;
        }
    }
    tx.commit().context("Failed to commit car park import")?;

    tracing::info!("imported {inserted} car parks ({skipped} skipped)");
    Ok(ImportStats { inserted, skipped })
}
