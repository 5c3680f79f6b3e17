pub mod args;
pub mod commands;
pub mod export;
pub mod validate;

use anyhow::Result;
use std::path::Path;

use sg_route_core::config::ServiceConfig;
use sg_route_core::db::SqliteStore;
use sg_route_core::db::paths::resolve_db_path;

use crate::ui::warning;

pub fn run(cli: args::Cli) -> Result<()> {
    let mut service = ServiceConfig::from_env()?;
    // --db wins over SG_ROUTE_DB
    if cli.db.is_some() {
        service.db_path = cli.db.clone();
    }

    match &cli.cmd {
        args::Commands::Db { cmd } => commands::db::run(&service, cmd),

        args::Commands::Evaluate {
            routes,
            public_only,
            profile,
            at,
            top,
            json,
            file,
        } => {
            validate::validate_top(*top, *public_only)?;
            let now = match at {
                Some(raw) => validate::parse_at(raw)?,
                None => chrono::Local::now().naive_local(),
            };
            let store = open_store(&service)?;
            let opts = commands::evaluate::EvaluateOptions {
                routes: routes.clone(),
                public_only: *public_only,
                profile: (*profile).into(),
                now,
                top: *top,
                json: *json,
                file: file.clone(),
            };
            let out = commands::evaluate::run(&store, &service, &opts);
            store.close()?;
            out
        }

        args::Commands::Rank {
            routes,
            public_only,
            top,
        } => {
            validate::validate_top(*top, *public_only)?;
            commands::rank::run(routes, *public_only, *top)
        }
    }
}

fn open_store(service: &ServiceConfig) -> Result<SqliteStore> {
    let db_path = resolve_db_path(service.db_path.clone())?;
    ensure_db_ready(&db_path)?;
    SqliteStore::open(&db_path)
}

fn ensure_db_ready(db_path: &Path) -> Result<()> {
    if db_path.exists() {
        return Ok(());
    }

    warning(format!(
        "Local database not found at: {}\nCreating an empty one; import snapshots with `sg_route db import`.",
        db_path.display()
    ));

    commands::db::init(db_path, false)
}
