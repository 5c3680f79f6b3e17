use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use sg_route_core::config::{EngineConfig, ScoringConfig, ServiceConfig, WeightProfile};
use sg_route_core::db::SqliteStore;
use sg_route_core::evaluate::{Evaluation, RouteEvaluator};
use sg_route_core::geocode::OneMapGeocoder;
use sg_route_core::model::candidates_from_json;
use sg_route_core::scoring::{RankedReport, RankingPolicy};

use crate::cli::export::EvaluationReport;
use crate::ui::{Style, dim, info, score, warning};

pub struct EvaluateOptions {
    pub routes: PathBuf,
    pub public_only: bool,
    pub profile: WeightProfile,
    pub now: NaiveDateTime,
    pub top: Option<usize>,
    pub json: bool,
    pub file: Option<PathBuf>,
}

pub fn run(store: &SqliteStore, service: &ServiceConfig, opts: &EvaluateOptions) -> Result<()> {
    let raw = fs::read_to_string(&opts.routes)
        .with_context(|| format!("Unable to read routes file: {}", opts.routes.display()))?;
    let candidates = candidates_from_json(&raw)?;

    let mut config = EngineConfig {
        scoring: ScoringConfig::with_profile(opts.profile),
        ..EngineConfig::default()
    };
    if let Some(n) = opts.top {
        config.ranker.public_top_n = n;
    }

    let geocoder = OneMapGeocoder::new(service.onemap_url.clone(), service.http_timeout)?;
    let evaluator = RouteEvaluator::new(store, &geocoder, config)?;
    let evaluation = evaluator.evaluate(&candidates, opts.now);

    let policy = if opts.public_only {
        RankingPolicy::PublicOnly
    } else {
        RankingPolicy::Mixed
    };
    let ranking = evaluation.rank(policy)?;

    if opts.json {
        let report = EvaluationReport::build(&evaluation, ranking, opts.profile.as_str());
        let s = serde_json::to_string_pretty(&report)?;

        if let Some(path) = &opts.file {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }

            let mut f = fs::File::create(path)?;
            f.write_all(s.as_bytes())?;
            f.write_all(b"\n")?;

            // stdout stays clean for scripting
            eprintln!("JSON written to {}", path.display());
        } else {
            println!("{}", s);
        }
        return Ok(());
    }

    print_table(&evaluation);
    print_ranking(&evaluation, &ranking);
    Ok(())
}

fn print_table(evaluation: &Evaluation) {
    let style = Style::default();

    println!(
        "Evaluated {} route(s) at {}",
        evaluation.routes.len(),
        evaluation.evaluated_at.format("%Y-%m-%d %H:%M")
    );
    println!();

    for (pos, r) in evaluation.routes.iter().enumerate() {
        let c = &r.candidate;
        let mode = if c.is_public_transport() {
            "public"
        } else {
            "private"
        };
        let time = if c.has_known_travel_time() {
            format!("{:.0} min", c.travel_time_min())
        } else {
            "unknown time".to_string()
        };

        println!(
            "#{:<2} {:<7} {:>12}  {:>6.1} km  score {}",
            pos + 1,
            mode,
            time,
            c.distance_km(),
            score(r.score(), style)
        );

        let b = &r.breakdown;
        let carpark = b
            .carpark
            .map(|v| format!("{v:.1}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "    {}",
            dim(
                format!(
                    "time {:.1} | incidents {:.1} | parking {}",
                    b.time, b.incident, carpark
                ),
                style
            )
        );

        for (road, s) in r.signals.iter().filter(|(_, s)| !s.is_clear()) {
            println!(
                "    {road}: {} incident(s), {} road work(s), {} breakdown(s)",
                s.incidents, s.roadworks, s.breakdowns
            );
        }
        if let Some(cps) = &r.carparks {
            for cp in cps {
                println!("    P {} ({} lots)", cp.development(), cp.available_lots());
            }
        }
    }
    println!();
}

fn print_ranking(evaluation: &Evaluation, ranking: &RankedReport) {
    if evaluation.is_partial() {
        warning("Evaluated with partial data:");
        for issue in evaluation.issues() {
            println!("  route {} ({:?}): {}", issue.route_index, issue.stage, issue.message);
        }
        println!();
    }

    info("Recommendation");
    println!("{}", ranking.summary);
}
