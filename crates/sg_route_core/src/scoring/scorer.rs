use serde::Serialize;

use crate::config::ScoringConfig;
use crate::model::{CarparkAvailability, RoadSignals, RouteCandidate, RouteScore};

/// Per-component scores behind a final route score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub time: f64,
    pub incident: f64,
    /// `None` when the parking term was not part of the weighting.
    pub carpark: Option<f64>,
    pub total: f64,
}

/// Combines travel time, road signals and parking into one desirability
/// score in `[0, max_score]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteScorer {
    config: ScoringConfig,
}

impl RouteScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Linear decay from `max_score` at 0 minutes to 0 at `max_time_min`.
    pub fn time_score(&self, minutes: f64) -> f64 {
        let c = &self.config;
        if minutes.is_nan() || minutes >= c.max_time_min {
            return 0.0;
        }
        (c.max_score * (1.0 - minutes / c.max_time_min)).clamp(0.0, c.max_score)
    }

    /// `max_score` minus the penalties of every road in the mapping, floored
    /// at 0.
    pub fn incident_score(&self, signals: &RoadSignals) -> f64 {
        let c = &self.config;
        let penalty: f64 = signals
            .iter()
            .map(|(_, s)| {
                f64::from(s.roadworks) * c.penalty_roadwork
                    + (f64::from(s.incidents) + f64::from(s.breakdowns)) * c.penalty_incident
            })
            .sum();
        (c.max_score - penalty).max(0.0)
    }

    /// Proportional to the lots available across the nearest car parks,
    /// capped at `max_score` once `max_carpark_lots` is reached.
    pub fn carpark_score(&self, carparks: &[CarparkAvailability]) -> f64 {
        let c = &self.config;
        let total: f64 = carparks.iter().map(|cp| f64::from(cp.available_lots())).sum();
        if total >= c.max_carpark_lots {
            c.max_score
        } else {
            total / c.max_carpark_lots * c.max_score
        }
    }

    /// Score with every component exposed.
    ///
    /// Public routes never use the parking term. A private route without any
    /// parking information (`carparks == None`) is weighted like a public
    /// one; an empty list counts as zero available lots.
    pub fn breakdown(
        &self,
        route: &RouteCandidate,
        signals: &RoadSignals,
        carparks: Option<&[CarparkAvailability]>,
    ) -> ScoreBreakdown {
        let c = &self.config;
        let time = self.time_score(route.travel_time_min());
        let incident = self.incident_score(signals);

        let (carpark, raw) = match (route.is_public_transport(), carparks) {
            (false, Some(cps)) => {
                let w = c.weights.private;
                let carpark = self.carpark_score(cps);
                (
                    Some(carpark),
                    w.time * time + w.incident * incident + w.carpark * carpark,
                )
            }
            _ => {
                let w = c.weights.public;
                (None, w.time * time + w.incident * incident)
            }
        };

        ScoreBreakdown {
            time,
            incident,
            carpark,
            total: clamp_score(raw, c.max_score),
        }
    }

    pub fn score(
        &self,
        route: &RouteCandidate,
        signals: &RoadSignals,
        carparks: Option<&[CarparkAvailability]>,
    ) -> RouteScore {
        RouteScore {
            score: self.breakdown(route, signals, carparks).total,
            is_public_transport: route.is_public_transport(),
        }
    }
}

fn clamp_score(raw: f64, max_score: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, max_score)
}
