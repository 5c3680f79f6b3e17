use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::db::has_table;
use crate::db::migrate::meta_get;

/// Row count and newest snapshot of one feed table.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedStatus {
    pub table: &'static str,
    pub rows: i64,
    pub newest: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreStatus {
    pub schema_version: Option<String>,
    pub feeds: Vec<FeedStatus>,
}

pub const FEED_TABLES: [&str; 3] = ["trafficincidents", "roadworks", "carpark"];

fn feed_status(con: &Connection, table: &'static str) -> Result<FeedStatus> {
    let sql = format!("SELECT COUNT(*), MAX(timestamp) FROM {}", table);
    let (rows, newest) = con
        .query_row(&sql, [], |r| Ok((r.get(0)?, r.get(1)?)))
        .with_context(|| format!("Failed to inspect table: {}", table))?;
    Ok(FeedStatus {
        table,
        rows,
        newest,
    })
}

pub fn inspect(con: &Connection) -> Result<StoreStatus> {
    let schema_version = if has_table(con, "meta")? {
        meta_get(con, "schema_version")?
    } else {
        None
    };

    let mut feeds = Vec::with_capacity(FEED_TABLES.len());
    for table in FEED_TABLES {
        if has_table(con, table)? {
            feeds.push(feed_status(con, table)?);
        }
    }

    Ok(StoreStatus {
        schema_version,
        feeds,
    })
}
