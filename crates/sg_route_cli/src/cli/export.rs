use serde::Serialize;

use sg_route_core::evaluate::{EnrichmentIssue, Evaluation};
use sg_route_core::model::{CarparkAvailability, RoadSignals};
use sg_route_core::scoring::{RankedReport, ScoreBreakdown};
use sg_route_core::signals::timestamp::format_store_timestamp;

#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub evaluated_at: String,
    pub profile: String,
    pub partial: bool,
    pub routes: Vec<RouteReport>,
    pub ranking: RankedReport,
    pub issues: Vec<EnrichmentIssue>,
}

#[derive(Debug, Serialize)]
pub struct RouteReport {
    pub route_index: usize,
    pub destination: String,
    pub is_public_transport: bool,
    /// `None` when the travel time was unknown.
    pub travel_time_min: Option<f64>,
    pub distance_km: f64,
    pub roads: RoadSignals,
    pub carparks: Option<Vec<CarparkAvailability>>,
    pub score: ScoreBreakdown,
}

impl EvaluationReport {
    pub fn build(evaluation: &Evaluation, ranking: RankedReport, profile: &str) -> Self {
        let routes = evaluation
            .routes
            .iter()
            .enumerate()
            .map(|(pos, r)| RouteReport {
                route_index: pos + 1,
                destination: r.candidate.destination().to_string(),
                is_public_transport: r.candidate.is_public_transport(),
                travel_time_min: r
                    .candidate
                    .has_known_travel_time()
                    .then(|| r.candidate.travel_time_min()),
                distance_km: r.candidate.distance_km(),
                roads: r.signals.clone(),
                carparks: r.carparks.clone(),
                score: r.breakdown,
            })
            .collect();

        Self {
            evaluated_at: format_store_timestamp(evaluation.evaluated_at),
            profile: profile.to_string(),
            partial: evaluation.is_partial(),
            routes,
            ranking,
            issues: evaluation.issues().cloned().collect(),
        }
    }
}
