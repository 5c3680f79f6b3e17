use serde::Serialize;

use crate::config::RankerConfig;
use crate::error::{EngineError, EngineResult};

pub const NO_PUBLIC_ROUTES: &str = "No public transport routes available.";
pub const NO_ROUTES: &str = "No suitable transport routes available.";

/// Selection policy, chosen by whether the traveller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankingPolicy {
    /// Non-drivers: best public routes only.
    PublicOnly,
    /// Drivers: two best private routes plus the best public one.
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRoute {
    /// 1-based position in the caller's original list.
    pub route_index: usize,
    pub score: f64,
    pub label: String,
    pub is_public_transport: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedReport {
    pub policy: RankingPolicy,
    pub entries: Vec<RankedRoute>,
    pub summary: String,
}

impl RankedReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// "Best route", "Second best route", "Third best route", "4th best route", ...
pub fn ordinal_label(position: usize) -> String {
    match position {
        0 => "Best route".to_string(),
        1 => "Second best route".to_string(),
        2 => "Third best route".to_string(),
        n => format!("{} best route", ordinal(n + 1)),
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    route_index: usize,
    score: f64,
    is_public: bool,
}

/// Validate the parallel arrays and pair them with 1-based route numbers.
fn entries(scores: &[f64], is_public: &[bool]) -> EngineResult<Vec<Entry>> {
    if scores.len() != is_public.len() {
        return Err(EngineError::InvalidInput(format!(
            "{} scores but {} transport-mode flags",
            scores.len(),
            is_public.len()
        )));
    }
    scores
        .iter()
        .zip(is_public)
        .enumerate()
        .map(|(i, (&score, &is_public))| {
            if !score.is_finite() {
                return Err(EngineError::InvalidInput(format!(
                    "route {}: score is not a finite number",
                    i + 1
                )));
            }
            Ok(Entry {
                route_index: i + 1,
                // -0.0 + 0.0 == +0.0, so signed zeros tie under total_cmp
                score: score + 0.0,
                is_public,
            })
        })
        .collect()
}

/// Highest score first; `sort_by` is stable so ties keep input order.
fn sort_desc(list: &mut [Entry]) {
    list.sort_by(|a, b| b.score.total_cmp(&a.score));
}

fn ranked(e: Entry, label: impl Into<String>) -> RankedRoute {
    RankedRoute {
        route_index: e.route_index,
        score: e.score,
        label: label.into(),
        is_public_transport: e.is_public,
    }
}

fn line(r: &RankedRoute) -> String {
    format!("{} is route {} (score={:.1})", r.label, r.route_index, r.score)
}

/// Best `top_n` public routes.
pub fn rank_public_only(scores: &[f64], is_public: &[bool], top_n: usize) -> EngineResult<RankedReport> {
    let mut public: Vec<Entry> = entries(scores, is_public)?
        .into_iter()
        .filter(|e| e.is_public)
        .collect();
    sort_desc(&mut public);

    let entries: Vec<RankedRoute> = public
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(pos, e)| ranked(e, ordinal_label(pos)))
        .collect();

    let summary = if entries.is_empty() {
        NO_PUBLIC_ROUTES.to_string()
    } else {
        let lines: Vec<String> = entries.iter().map(line).collect();
        format!("For public transport options,\n{}.", lines.join(".\n"))
    };

    Ok(RankedReport {
        policy: RankingPolicy::PublicOnly,
        entries,
        summary,
    })
}

/// Two best private routes plus the best public route. Missing categories
/// are left out, never padded.
pub fn rank_mixed(scores: &[f64], is_public: &[bool]) -> EngineResult<RankedReport> {
    let (mut public, mut private): (Vec<Entry>, Vec<Entry>) =
        entries(scores, is_public)?.into_iter().partition(|e| e.is_public);
    sort_desc(&mut private);
    sort_desc(&mut public);

    let mut entries: Vec<RankedRoute> = private
        .into_iter()
        .take(2)
        .zip(["Best private route", "Second best private route"])
        .map(|(e, label)| ranked(e, label))
        .collect();

    if let Some(&best) = public.first() {
        entries.push(ranked(best, "Best public route"));
    }

    let summary = if entries.is_empty() {
        NO_ROUTES.to_string()
    } else {
        let lines: Vec<String> = entries.iter().map(line).collect();
        format!("{}.", lines.join("\n"))
    };

    Ok(RankedReport {
        policy: RankingPolicy::Mixed,
        entries,
        summary,
    })
}

pub fn rank(
    scores: &[f64],
    is_public: &[bool],
    policy: RankingPolicy,
    config: RankerConfig,
) -> EngineResult<RankedReport> {
    match policy {
        RankingPolicy::PublicOnly => rank_public_only(scores, is_public, config.public_top_n),
        RankingPolicy::Mixed => rank_mixed(scores, is_public),
    }
}
