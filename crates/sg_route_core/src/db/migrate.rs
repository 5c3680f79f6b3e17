use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Transaction};

pub const SCHEMA_VERSION: i64 = 2;

fn column_exists(tx: &Transaction<'_>, table: &str, col: &str) -> Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = tx.prepare(&sql)?;
    let mut rows = stmt.query([])?;

    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?; // PRAGMA table_info: 1 = name
        if name.eq_ignore_ascii_case(col) {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn meta_get(con: &Connection, key: &str) -> Result<Option<String>> {
    con.query_row("SELECT value FROM meta WHERE key = ?1", [key], |r| {
        r.get::<_, String>(0)
    })
    .optional()
    .with_context(|| format!("Failed to read meta key: {}", key))
}

fn meta_get_i64(con: &Connection, key: &str) -> Result<Option<i64>> {
    match meta_get(con, key)? {
        None => Ok(None),
        Some(v) => Ok(Some(v.parse::<i64>().with_context(|| {
            format!(
                "Invalid integer value in meta table for key '{}': '{}'",
                key, v
            )
        })?)),
    }
}

pub fn meta_upsert(con: &Connection, key: &str, value: &str) -> Result<()> {
    con.execute(
        r#"
        INSERT INTO meta(key, value) VALUES (?1, ?2)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
        (key, value),
    )?;
    Ok(())
}

fn m_to_v1(tx: &Transaction<'_>) -> Result<()> {
    tx.execute_batch(
        r#"
        -- =========================
        -- TRAFFIC INCIDENTS
        -- =========================
        CREATE TABLE IF NOT EXISTS trafficincidents (
            type      TEXT NOT NULL,
            latitude  REAL,
            longitude REAL,
            message   TEXT NOT NULL
        );

        -- =========================
        -- CAR PARK AVAILABILITY
        -- =========================
        CREATE TABLE IF NOT EXISTS carpark (
            carparkid     TEXT,
            area          TEXT,
            development   TEXT NOT NULL,
            location      TEXT NOT NULL,
            availablelots INTEGER NOT NULL,
            lottype       TEXT,
            agency        TEXT,
            timestamp     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_carpark_timestamp
          ON carpark(timestamp);
        "#,
    )
    .context("Failed to migrate schema to v1 (incident and car park tables)")?;

    Ok(())
}

fn m_to_v2(tx: &Transaction<'_>) -> Result<()> {
    if !column_exists(tx, "trafficincidents", "timestamp")? {
        tx.execute_batch(
            r#"
            ALTER TABLE trafficincidents ADD COLUMN timestamp TEXT;
            "#,
        )
        .context("Failed to add trafficincidents.timestamp")?;
    }

    tx.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_trafficincidents_timestamp
          ON trafficincidents(timestamp);

        -- =========================
        -- ROAD WORKS (scheduled)
        -- =========================
        CREATE TABLE IF NOT EXISTS roadworks (
            eventid   TEXT,
            startdate TEXT NOT NULL,
            enddate   TEXT NOT NULL,
            svcdept   TEXT,
            roadname  TEXT NOT NULL,
            other     TEXT,
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_roadworks_timestamp
          ON roadworks(timestamp);
        "#,
    )
    .context("Failed to migrate schema to v2 (road works feed, snapshot timestamps)")?;

    Ok(())
}

/// Create the bookkeeping table. Safe on an existing database.
pub fn create_meta(con: &Connection) -> Result<()> {
    con.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .context("Failed to create meta table")?;
    Ok(())
}

/// Run schema migrations up to SCHEMA_VERSION.
/// Idempotent and safe to call on every open.
pub fn run(con: &mut Connection) -> Result<()> {
    create_meta(con)?;

    let current = meta_get_i64(con, "schema_version")?.unwrap_or(0);

    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    tracing::info!(
        "Database schema upgrade required (current: v{}, target: v{})",
        current,
        SCHEMA_VERSION
    );

    let tx = con
        .transaction()
        .context("Failed to start migration transaction")?;

    if current < 1 {
        tracing::info!("Applying migration: v0 → v1 (incidents, car parks)");
        m_to_v1(&tx)?;
        meta_upsert(&tx, "schema_version", "1")
            .context("Failed to update meta.schema_version to 1")?;
    }

    if current < 2 {
        tracing::info!("Applying migration: v1 → v2 (road works, snapshot timestamps)");
        m_to_v2(&tx)?;
        meta_upsert(&tx, "schema_version", "2")
            .context("Failed to update meta.schema_version to 2")?;
    }

    tx.commit().context("Failed to commit migration")?;

    tracing::info!("Database schema successfully updated");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::has_table;

    #[test]
    fn migrates_empty_database_and_is_idempotent() {
        let mut con = Connection::open_in_memory().unwrap();
        run(&mut con).unwrap();
        run(&mut con).unwrap();

        for t in ["meta", "trafficincidents", "roadworks", "carpark"] {
            assert!(has_table(&con, t).unwrap(), "missing table {t}");
        }
        assert_eq!(
            meta_get(&con, "schema_version").unwrap().as_deref(),
            Some("2")
        );
    }

    #[test]
    fn upgrades_v1_incidents_table_in_place() {
        let mut con = Connection::open_in_memory().unwrap();
        create_meta(&con).unwrap();
        {
            let tx = con.transaction().unwrap();
            m_to_v1(&tx).unwrap();
            meta_upsert(&tx, "schema_version", "1").unwrap();
            tx.commit().unwrap();
        }
        con.execute(
            "INSERT INTO trafficincidents(type, message) VALUES ('Accident', '(01/01)08:00 x')",
            [],
        )
        .unwrap();

        run(&mut con).unwrap();

        let n: i64 = con
            .query_row(
                "SELECT COUNT(*) FROM trafficincidents WHERE timestamp IS NULL",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(n, 1);
    }
}
