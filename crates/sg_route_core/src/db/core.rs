use anyhow::{Context, Result};
use rusqlite::Connection;
use std::time::Duration;

/// Lock wait before a query gives up with SQLITE_BUSY.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn open_db(path: &str) -> Result<Connection> {
    let con = Connection::open(path).with_context(|| format!("Unable to open database: {path}"))?;
    con.busy_timeout(DEFAULT_BUSY_TIMEOUT)
        .context("Unable to set busy timeout")?;
    Ok(con)
}

pub fn has_table(con: &Connection, table: &str) -> Result<bool> {
    let n: i64 = con.query_row(
        r#"
        SELECT COUNT(*)
        FROM sqlite_master
        WHERE type = 'table' AND name = ?1
        "#,
        [table],
        |r| r.get(0),
    )?;
    Ok(n > 0)
}
