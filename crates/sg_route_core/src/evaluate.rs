//! End-to-end evaluation of a batch of route candidates.
//!
//! The evaluator wires the extractor, resolver and scorer together around
//! injected collaborators. Enrichment failures never abort the batch: the
//! affected term falls back to its neutral value and the failure is kept on
//! the route as an [`EnrichmentIssue`].

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::geocode::Geocoder;
use crate::model::{CarparkAvailability, RoadSignals, RouteCandidate};
use crate::normalize::normalize_text;
use crate::parking::ParkingProximityResolver;
use crate::scoring::{RankedReport, RankingPolicy, RouteScorer, ScoreBreakdown, rank};
use crate::signals::TrafficSignalExtractor;
use crate::store::SignalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentStage {
    Traffic,
    Parking,
}

/// A degraded enrichment step for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentIssue {
    pub route_index: usize,
    pub stage: EnrichmentStage,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct EvaluatedRoute {
    pub candidate: RouteCandidate,
    pub signals: RoadSignals,
    /// `None` for public routes and when parking could not be resolved.
    pub carparks: Option<Vec<CarparkAvailability>>,
    pub breakdown: ScoreBreakdown,
    pub issues: Vec<EnrichmentIssue>,
}

impl EvaluatedRoute {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub evaluated_at: NaiveDateTime,
    pub routes: Vec<EvaluatedRoute>,
    config: EngineConfig,
}

impl Evaluation {
    pub fn scores(&self) -> Vec<f64> {
        self.routes.iter().map(EvaluatedRoute::score).collect()
    }

    pub fn public_flags(&self) -> Vec<bool> {
        self.routes
            .iter()
            .map(|r| r.candidate.is_public_transport())
            .collect()
    }

    /// True when at least one route was scored with partial data.
    pub fn is_partial(&self) -> bool {
        self.routes.iter().any(|r| !r.issues.is_empty())
    }

    pub fn issues(&self) -> impl Iterator<Item = &EnrichmentIssue> {
        self.routes.iter().flat_map(|r| r.issues.iter())
    }

    pub fn rank(&self, policy: RankingPolicy) -> EngineResult<RankedReport> {
        rank(&self.scores(), &self.public_flags(), policy, self.config.ranker)
    }
}

type ParkingOutcome = Result<Vec<CarparkAvailability>, String>;

pub struct RouteEvaluator<'a, S: SignalStore + ?Sized, G: Geocoder + ?Sized> {
    store: &'a S,
    geocoder: &'a G,
    config: EngineConfig,
}

impl<'a, S, G> RouteEvaluator<'a, S, G>
where
    S: SignalStore + ?Sized,
    G: Geocoder + ?Sized,
{
    pub fn new(store: &'a S, geocoder: &'a G, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            geocoder,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Score every candidate as of `now`.
    pub fn evaluate(&self, candidates: &[RouteCandidate], now: NaiveDateTime) -> Evaluation {
        let scorer = RouteScorer::new(self.config.scoring);
        let extractor = TrafficSignalExtractor::new(self.store, self.config.windows.traffic);
        let resolver = ParkingProximityResolver::new(
            self.store,
            self.geocoder,
            self.config.windows.parking,
            self.config.nearest_carparks,
        );
        let retry = self.config.retry;

        // Keyed by normalized destination; one lookup per place per batch.
        let mut parking_cache: HashMap<String, ParkingOutcome> = HashMap::new();
        let mut routes = Vec::with_capacity(candidates.len());

        for (pos, candidate) in candidates.iter().enumerate() {
            // Ranker numbering: 1-based position in this batch.
            let route_index = pos + 1;
            let mut issues = Vec::new();

            let signals = match retry.run("traffic signals", || extractor.extract(candidate.roads(), now)) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(
                        "route {}: traffic signals unavailable, scoring without them: {e}",
                        route_index
                    );
                    issues.push(EnrichmentIssue {
                        route_index,
                        stage: EnrichmentStage::Traffic,
                        message: e.to_string(),
                    });
                    RoadSignals::new()
                }
            };

            let carparks = if candidate.is_public_transport() {
                None
            } else {
                let key = normalize_text(candidate.destination());
                let outcome = parking_cache.entry(key).or_insert_with(|| {
                    retry
                        .run("car park lookup", || resolver.resolve(candidate.destination(), now))
                        .map_err(|e| e.to_string())
                });
                match outcome {
                    Ok(cps) => Some(cps.clone()),
                    Err(msg) => {
                        tracing::warn!(
                            "route {}: parking unavailable for '{}', omitting the parking term: {msg}",
                            route_index,
                            candidate.destination()
                        );
                        issues.push(EnrichmentIssue {
                            route_index,
                            stage: EnrichmentStage::Parking,
                            message: msg.clone(),
                        });
                        None
                    }
                }
            };

            let breakdown = scorer.breakdown(candidate, &signals, carparks.as_deref());
            tracing::debug!(
                "route {}: time={:.1} incident={:.1} carpark={:?} total={:.1}",
                route_index,
                breakdown.time,
                breakdown.incident,
                breakdown.carpark,
                breakdown.total
            );

            routes.push(EvaluatedRoute {
                candidate: candidate.clone(),
                signals,
                carparks,
                breakdown,
                issues,
            });
        }

        Evaluation {
            evaluated_at: now,
            routes,
            config: self.config,
        }
    }
}
