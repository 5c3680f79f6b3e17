use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::{Connection, params};
use std::path::Path;

use crate::db::{migrate, open_db};
use crate::error::{EngineError, EngineResult};
use crate::signals::timestamp::format_store_timestamp;
use crate::store::{CarparkRow, IncidentRow, RoadworkRow, SignalStore};

/// Signal store backed by the local SQLite snapshot.
///
/// The caller owns the lifecycle: open once per evaluation batch, pass by
/// reference to the engine, `close()` when done.
pub struct SqliteStore {
    con: Connection,
}

impl SqliteStore {
    /// Open (and migrate) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let mut con = open_db(&path.to_string_lossy())?;
        migrate::run(&mut con)?;
        Ok(Self { con })
    }

    /// Wrap an existing connection; the schema is migrated first.
    pub fn from_connection(mut con: Connection) -> Result<Self> {
        migrate::run(&mut con)?;
        Ok(Self { con })
    }

    pub fn connection(&self) -> &Connection {
        &self.con
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.con
    }

    pub fn close(self) -> Result<()> {
        self.con
            .close()
            .map_err(|(_, e)| e)
            .context("Failed to close database")
    }
}

impl SignalStore for SqliteStore {
    fn incidents_since(&self, since: NaiveDateTime) -> EngineResult<Vec<IncidentRow>> {
        let op = "querying traffic incidents";
        // Rows without a snapshot time cannot be pre-filtered here; their
        // message token decides.
        let mut stmt = self
            .con
            .prepare(
                r#"
                SELECT type, message, latitude, longitude, timestamp
                FROM trafficincidents
                WHERE timestamp IS NULL OR timestamp >= ?1
                "#,
            )
            .map_err(|e| EngineError::store(op, e))?;

        let rows = stmt
            .query_map(params![format_store_timestamp(since)], |r| {
                Ok(IncidentRow {
                    kind: r.get(0)?,
                    message: r.get(1)?,
                    latitude: r.get(2)?,
                    longitude: r.get(3)?,
                    timestamp: r.get(4)?,
                })
            })
            .map_err(|e| EngineError::store(op, e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EngineError::store(op, e))?;

        Ok(rows)
    }

    fn roadworks_since(&self, since: NaiveDateTime) -> EngineResult<Vec<RoadworkRow>> {
        let op = "querying road works";
        let mut stmt = self
            .con
            .prepare(
                r#"
                SELECT roadname, startdate, enddate, timestamp
                FROM roadworks
                WHERE timestamp >= ?1
                "#,
            )
            .map_err(|e| EngineError::store(op, e))?;

        let rows = stmt
            .query_map(params![format_store_timestamp(since)], |r| {
                Ok(RoadworkRow {
                    road_name: r.get(0)?,
                    start_date: r.get(1)?,
                    end_date: r.get(2)?,
                    timestamp: r.get(3)?,
                })
            })
            .map_err(|e| EngineError::store(op, e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EngineError::store(op, e))?;

        Ok(rows)
    }

    fn carparks_since(&self, since: NaiveDateTime) -> EngineResult<Vec<CarparkRow>> {
        let op = "querying car park availability";
        let mut stmt = self
            .con
            .prepare(
                r#"
                SELECT development, location, availablelots, timestamp
                FROM carpark
                WHERE timestamp >= ?1
                ORDER BY rowid
                "#,
            )
            .map_err(|e| EngineError::store(op, e))?;

        let rows = stmt
            .query_map(params![format_store_timestamp(since)], |r| {
                Ok(CarparkRow {
                    development: r.get(0)?,
                    location: r.get(1)?,
                    available_lots: r.get(2)?,
                    timestamp: r.get(3)?,
                })
            })
            .map_err(|e| EngineError::store(op, e))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| EngineError::store(op, e))?;

        Ok(rows)
    }
}
