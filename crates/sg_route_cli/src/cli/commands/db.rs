use anyhow::{Context, Result, bail};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::Path;

use sg_route_core::config::ServiceConfig;
use sg_route_core::db::import::{
    ImportMode, ImportStats, import_carparks_csv, import_incidents_csv, import_roadworks_csv,
};
use sg_route_core::db::migrate::{meta_get, meta_upsert};
use sg_route_core::db::paths::{ensure_parent_dir, resolve_db_path};
use sg_route_core::db::{SqliteStore, status};
use sg_route_core::signals::timestamp::format_store_timestamp;

use crate::cli::args::DbCommands;
use crate::ui::{error, success, warning};

pub fn run(service: &ServiceConfig, cmd: &DbCommands) -> Result<()> {
    let db_path = resolve_db_path(service.db_path.clone())?;

    match cmd {
        DbCommands::Init { force } => init(&db_path, *force),
        DbCommands::Status => show_status(&db_path),
        DbCommands::Import {
            incidents,
            roadworks,
            carparks,
            replace,
        } => {
            if incidents.is_none() && roadworks.is_none() && carparks.is_none() {
                bail!("Nothing to import: pass --incidents, --roadworks and/or --carparks.");
            }
            let mode = if *replace {
                ImportMode::Replace
            } else {
                ImportMode::Append
            };
            import(&db_path, incidents.as_deref(), roadworks.as_deref(), carparks.as_deref(), mode)
        }
    }
}

pub fn init(db_path: &Path, force: bool) -> Result<()> {
    ensure_parent_dir(db_path)?;

    if db_path.exists() {
        if force || confirm_overwrite(db_path)? {
            fs::remove_file(db_path).with_context(|| {
                format!("Unable to remove existing database: {}", db_path.display())
            })?;
        } else {
            eprintln!("Aborted. Existing database was not modified.");
            return Ok(());
        }
    }

    println!("Initializing local database at: {}", db_path.display());
    let store = SqliteStore::open(db_path)?;
    store.close()?;
    success("Done.");
    Ok(())
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    // Prompt only on an interactive stdin
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    eprintln!("Database already exists:\n  {}\n", path.display());
    eprint!("Overwrite existing database? [y/N]: ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}

fn show_status(db_path: &Path) -> Result<()> {
    println!("Database path: {}", db_path.display());

    if !db_path.exists() {
        error("Status: MISSING");
        println!("Hint: run `sg_route db init` to create it.");
        return Ok(());
    }

    let meta_fs = fs::metadata(db_path).context("Unable to read database file metadata")?;
    success("Status: OK");
    println!("Size: {} bytes", meta_fs.len());

    // Plain open: status must not migrate.
    let con = rusqlite::Connection::open(db_path)
        .with_context(|| format!("Unable to open database: {}", db_path.display()))?;
    let st = status::inspect(&con)?;

    println!();
    match &st.schema_version {
        Some(v) => println!("Schema version: {v}"),
        None => warning("Table 'meta' is missing (database not initialized or schema is invalid)"),
    }
    if st.schema_version.is_some()
        && let Some(at) = meta_get(&con, "last_import")?
    {
        println!("Last import: {at}");
    }

    println!();
    println!("Feeds:");
    for feed in &st.feeds {
        println!(
            "  {:<17} {:>8} rows  newest: {}",
            feed.table,
            feed.rows,
            feed.newest.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

fn open_csv(path: &Path) -> Result<BufReader<File>> {
    let f = File::open(path).with_context(|| format!("Unable to open CSV: {}", path.display()))?;
    Ok(BufReader::new(f))
}

fn report(what: &str, stats: ImportStats) {
    success(format!("{what}: {} row(s) imported", stats.inserted));
    if stats.skipped > 0 {
        warning(format!("{what}: {} row(s) skipped", stats.skipped));
    }
}

fn import(
    db_path: &Path,
    incidents: Option<&Path>,
    roadworks: Option<&Path>,
    carparks: Option<&Path>,
    mode: ImportMode,
) -> Result<()> {
    ensure_parent_dir(db_path)?;
    let mut store = SqliteStore::open(db_path)?;
    let imported_at = chrono::Local::now().naive_local();

    {
        let con = store.connection_mut();
        if let Some(p) = incidents {
            report("Traffic incidents", import_incidents_csv(con, open_csv(p)?, imported_at, mode)?);
        }
        if let Some(p) = roadworks {
            report("Road works", import_roadworks_csv(con, open_csv(p)?, imported_at, mode)?);
        }
        if let Some(p) = carparks {
            report("Car parks", import_carparks_csv(con, open_csv(p)?, imported_at, mode)?);
        }
        meta_upsert(con, "last_import", &format_store_timestamp(imported_at))?;
    }

    store.close()
}
