mod common;

use chrono::NaiveDateTime;

use sg_route_core::config::EngineConfig;
use sg_route_core::error::{EngineError, EngineResult};
use sg_route_core::evaluate::{EnrichmentStage, RouteEvaluator};
use sg_route_core::retry::RetryPolicy;
use sg_route_core::scoring::RankingPolicy;
use sg_route_core::store::{CarparkRow, IncidentRow, RoadworkRow, SignalStore};

use common::{
    DownGeocoder, FakeGeocoder, add_carpark, add_incident, memory_store, minutes_ago, now,
    private_route, public_route,
};

const MARINA: (f64, f64) = (1.2903, 103.8520);

fn config() -> EngineConfig {
    EngineConfig {
        retry: RetryPolicy::none(),
        ..EngineConfig::default()
    }
}

/// Store whose every query fails.
struct BrokenStore;

impl SignalStore for BrokenStore {
    fn incidents_since(&self, _: NaiveDateTime) -> EngineResult<Vec<IncidentRow>> {
        Err(EngineError::store("querying traffic incidents", rusqlite::Error::InvalidQuery))
    }

    fn roadworks_since(&self, _: NaiveDateTime) -> EngineResult<Vec<RoadworkRow>> {
        Err(EngineError::store("querying road works", rusqlite::Error::InvalidQuery))
    }

    fn carparks_since(&self, _: NaiveDateTime) -> EngineResult<Vec<CarparkRow>> {
        Err(EngineError::store("querying car park availability", rusqlite::Error::InvalidQuery))
    }
}

#[test]
fn full_pipeline_scores_and_ranks() {
    let store = memory_store();
    add_incident(
        &store,
        "Accident",
        minutes_ago(15),
        "Accident on PIE (towards Changi) after Adam Rd Exit.",
        minutes_ago(5),
    );
    add_carpark(&store, "Marina Square", MARINA.0 + 0.001, MARINA.1, 60, minutes_ago(10));
    add_carpark(&store, "Suntec City", MARINA.0 + 0.003, MARINA.1, 60, minutes_ago(10));

    let geocoder = FakeGeocoder::default().with("Marina Square", &[MARINA]);
    let evaluator = RouteEvaluator::new(&store, &geocoder, config()).unwrap();

    let routes = vec![
        private_route(1, &["PIE", "Nicoll Hwy"], "Marina Square", 30.0),
        private_route(2, &["ECP"], "Marina Square", 36.0),
        public_route(3, &["PIE"], "Marina Square", 48.0),
    ];
    let evaluation = evaluator.evaluate(&routes, now());

    assert!(!evaluation.is_partial());
    assert_eq!(evaluation.routes.len(), 3);

    // 120 lots available across the two car parks: parking term capped.
    let first = &evaluation.routes[0];
    assert_eq!(first.carparks.as_ref().map(Vec::len), Some(2));
    assert_eq!(first.breakdown.carpark, Some(100.0));
    assert!((first.breakdown.incident - 80.0).abs() < 1e-9);
    assert!((first.score() - (0.6 * 75.0 + 0.3 * 80.0 + 0.1 * 100.0)).abs() < 1e-9);

    let second = &evaluation.routes[1];
    assert!((second.score() - (0.6 * 70.0 + 0.3 * 100.0 + 0.1 * 100.0)).abs() < 1e-9);

    let third = &evaluation.routes[2];
    assert!(third.carparks.is_none());
    assert!((third.score() - (0.7 * 60.0 + 0.3 * 80.0)).abs() < 1e-9);

    let report = evaluation.rank(RankingPolicy::Mixed).unwrap();
    let order: Vec<usize> = report.entries.iter().map(|e| e.route_index).collect();
    assert_eq!(order, vec![2, 1, 3]);
}

#[test]
fn parking_is_resolved_once_per_destination() {
    let store = memory_store();
    let geocoder = FakeGeocoder::default().with("Marina Square", &[MARINA]);
    let evaluator = RouteEvaluator::new(&store, &geocoder, config()).unwrap();

    let routes = vec![
        private_route(1, &[], "Marina Square", 30.0),
        private_route(2, &[], "marina square", 35.0),
        public_route(3, &[], "Marina Square", 40.0),
    ];
    let evaluation = evaluator.evaluate(&routes, now());

    assert_eq!(geocoder.calls.get(), 1);
    // No fresh car parks: empty list, not missing data.
    assert_eq!(evaluation.routes[0].carparks.as_deref(), Some(&[][..]));
    assert!(!evaluation.is_partial());
}

#[test]
fn geocoder_outage_drops_only_the_parking_term() {
    let store = memory_store();
    let evaluator = RouteEvaluator::new(&store, &DownGeocoder, config()).unwrap();

    let routes = vec![
        private_route(1, &["PIE"], "Marina Square", 60.0),
        public_route(2, &["PIE"], "Marina Square", 60.0),
    ];
    let evaluation = evaluator.evaluate(&routes, now());

    assert!(evaluation.is_partial());
    let issues: Vec<_> = evaluation.issues().collect();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].route_index, 1);
    assert_eq!(issues[0].stage, EnrichmentStage::Parking);

    // Weighted like the public route when parking is unknown.
    let private = &evaluation.routes[0];
    assert!(private.carparks.is_none());
    assert!((private.score() - evaluation.routes[1].score()).abs() < 1e-9);
}

#[test]
fn unknown_destination_is_recorded_not_fatal() {
    let store = memory_store();
    let geocoder = FakeGeocoder::default();
    let evaluator = RouteEvaluator::new(&store, &geocoder, config()).unwrap();

    let evaluation = evaluator.evaluate(&[private_route(1, &[], "Atlantis", 10.0)], now());

    let issue = evaluation.issues().next().expect("parking issue");
    assert_eq!(issue.stage, EnrichmentStage::Parking);
    assert!(issue.message.contains("Atlantis"));
}

#[test]
fn store_outage_yields_neutral_signals() {
    let geocoder = FakeGeocoder::default().with("Marina Square", &[MARINA]);
    let evaluator = RouteEvaluator::new(&BrokenStore, &geocoder, config()).unwrap();

    let routes = vec![
        private_route(1, &["PIE"], "Marina Square", 60.0),
        public_route(2, &["PIE"], "Marina Square", 60.0),
    ];
    let evaluation = evaluator.evaluate(&routes, now());

    let stages: Vec<(usize, EnrichmentStage)> =
        evaluation.issues().map(|i| (i.route_index, i.stage)).collect();
    assert_eq!(
        stages,
        vec![
            (1, EnrichmentStage::Traffic),
            (1, EnrichmentStage::Parking),
            (2, EnrichmentStage::Traffic),
        ]
    );

    for r in &evaluation.routes {
        assert!(r.signals.is_empty());
        assert!((r.breakdown.incident - 100.0).abs() < 1e-9);
    }

    // Ranking still produces a recommendation.
    let report = evaluation.rank(RankingPolicy::PublicOnly).unwrap();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].route_index, 2);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let store = memory_store();
    let geocoder = FakeGeocoder::default();
    let mut cfg = config();
    cfg.nearest_carparks = 0;

    assert!(matches!(
        RouteEvaluator::new(&store, &geocoder, cfg),
        Err(EngineError::InvalidConfig(_))
    ));
}
