use chrono::{Duration, NaiveDateTime};
use std::collections::HashSet;

use crate::error::EngineResult;
use crate::model::{RoadSignal, RoadSignals};
use crate::normalize::{mentions, normalize_text};
use crate::signals::timestamp::{
    is_recent, parse_feed_date, parse_message_timestamp, parse_store_timestamp, window_start,
};
use crate::store::SignalStore;

/// Which counter an incident row feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Incident,
    Roadwork,
    Breakdown,
}

impl SignalKind {
    /// Map a feed category ("Accident", "Roadwork", "Vehicle breakdown", ...).
    pub fn classify(kind: &str) -> Self {
        let k = normalize_text(kind);
        if k.contains("breakdown") {
            SignalKind::Breakdown
        } else if k.replace(' ', "").starts_with("roadwork") {
            SignalKind::Roadwork
        } else {
            SignalKind::Incident
        }
    }

    fn bump(self, signal: &mut RoadSignal) {
        match self {
            SignalKind::Incident => signal.incidents += 1,
            SignalKind::Roadwork => signal.roadworks += 1,
            SignalKind::Breakdown => signal.breakdowns += 1,
        }
    }
}

struct Target {
    name: String,
    norm: String,
}

/// Aggregates recent incident / roadwork / breakdown counts per road.
pub struct TrafficSignalExtractor<'a, S: SignalStore + ?Sized> {
    store: &'a S,
    window: Duration,
}

impl<'a, S: SignalStore + ?Sized> TrafficSignalExtractor<'a, S> {
    pub fn new(store: &'a S, window: Duration) -> Self {
        Self { store, window }
    }

    /// Counts for every distinct road in `roads` (compared after
    /// normalization; the first spelling is kept as the key). Roads without
    /// any signal map to zero counts.
    pub fn extract<R: AsRef<str>>(&self, roads: &[R], now: NaiveDateTime) -> EngineResult<RoadSignals> {
        let mut targets: Vec<Target> = Vec::new();
        for road in roads {
            let name = road.as_ref().trim();
            let norm = normalize_text(name);
            if norm.is_empty() || targets.iter().any(|t| t.norm == norm) {
                continue;
            }
            targets.push(Target {
                name: name.to_string(),
                norm,
            });
        }

        let mut signals: RoadSignals = targets
            .iter()
            .map(|t| (t.name.clone(), RoadSignal::default()))
            .collect();

        if targets.is_empty() {
            return Ok(signals);
        }

        let since = window_start(now, self.window);
        self.count_incidents(&targets, &mut signals, since, now)?;
        self.count_roadworks(&targets, &mut signals, since, now)?;

        Ok(signals)
    }

    fn count_incidents(
        &self,
        targets: &[Target],
        signals: &mut RoadSignals,
        since: NaiveDateTime,
        now: NaiveDateTime,
    ) -> EngineResult<()> {
        let rows = self.store.incidents_since(since)?;

        // The feed is snapshotted repeatedly; one event shows up once per
        // snapshot.
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut malformed = 0usize;

        for row in &rows {
            if let Some(Ok(snapshot)) = row.timestamp.as_deref().map(parse_store_timestamp) {
                if !is_recent(snapshot, since) {
                    continue;
                }
            }

            let (at, body) = match parse_message_timestamp(&row.message, now) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!("dropping incident row: {e}");
                    malformed += 1;
                    continue;
                }
            };
            // Events stamped after `now` have not happened yet.
            if !is_recent(at, since) || at > now {
                continue;
            }
            if !seen.insert((row.kind.trim().to_string(), row.message.trim().to_string())) {
                continue;
            }

            let kind = SignalKind::classify(&row.kind);
            let body_norm = normalize_text(body);
            for t in targets {
                if mentions(&body_norm, &t.norm) {
                    if let Some(s) = signals.get_mut(&t.name) {
                        kind.bump(s);
                    }
                }
            }
        }

        if malformed > 0 {
            tracing::debug!("{malformed} incident rows dropped for malformed timestamps");
        }
        Ok(())
    }

    fn count_roadworks(
        &self,
        targets: &[Target],
        signals: &mut RoadSignals,
        since: NaiveDateTime,
        now: NaiveDateTime,
    ) -> EngineResult<()> {
        let rows = self.store.roadworks_since(since)?;
        let today = now.date();
        let mut seen: HashSet<(String, String, String)> = HashSet::new();

        for row in &rows {
            let snapshot = match parse_store_timestamp(&row.timestamp) {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!("dropping road works row: {e}");
                    continue;
                }
            };
            if !is_recent(snapshot, since) {
                continue;
            }

            let (Some(start), Some(end)) = (parse_feed_date(&row.start_date), parse_feed_date(&row.end_date))
            else {
                tracing::debug!(
                    "dropping road works row for '{}': unreadable date range",
                    row.road_name
                );
                continue;
            };
            if today < start || today > end {
                continue;
            }

            let road_norm = normalize_text(&row.road_name);
            if !seen.insert((road_norm.clone(), start.to_string(), end.to_string())) {
                continue;
            }

            for t in targets {
                if mentions(&road_norm, &t.norm) || mentions(&t.norm, &road_norm) {
                    if let Some(s) = signals.get_mut(&t.name) {
                        s.roadworks += 1;
                    }
                }
            }
        }
        Ok(())
    }
}
