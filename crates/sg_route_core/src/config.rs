use chrono::Duration;
use std::time::Duration as StdDuration;

use crate::error::{EngineError, EngineResult};
use crate::retry::RetryPolicy;

pub const DEFAULT_ONEMAP_URL: &str = "https://www.onemap.gov.sg/api/common/elastic/search";

pub const ENV_DB_PATH: &str = "SG_ROUTE_DB";
pub const ENV_ONEMAP_URL: &str = "SG_ROUTE_ONEMAP_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "SG_ROUTE_HTTP_TIMEOUT_SECS";

/// Weights for private-transport routes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrivateWeights {
    pub time: f64,
    pub incident: f64,
    pub carpark: f64,
}

/// Weights for public-transport routes (no parking term).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PublicWeights {
    pub time: f64,
    pub incident: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub private: PrivateWeights,
    pub public: PublicWeights,
}

/// Named private-transport weightings. Both have been used in production;
/// neither is canonical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightProfile {
    /// time 0.6, incidents 0.3, parking 0.1
    #[default]
    TimeFirst,
    /// time 0.5, incidents 0.2, parking 0.3
    ParkingAware,
}

impl WeightProfile {
    pub fn weights(self) -> ScoringWeights {
        let private = match self {
            WeightProfile::TimeFirst => PrivateWeights {
                time: 0.6,
                incident: 0.3,
                carpark: 0.1,
            },
            WeightProfile::ParkingAware => PrivateWeights {
                time: 0.5,
                incident: 0.2,
                carpark: 0.3,
            },
        };
        ScoringWeights {
            private,
            public: PublicWeights {
                time: 0.7,
                incident: 0.3,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WeightProfile::TimeFirst => "time-first",
            WeightProfile::ParkingAware => "parking-aware",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub max_score: f64,
    pub max_time_min: f64,
    pub max_carpark_lots: f64,
    pub penalty_roadwork: f64,
    pub penalty_incident: f64,
    pub weights: ScoringWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::with_profile(WeightProfile::default())
    }
}

impl ScoringConfig {
    pub fn with_profile(profile: WeightProfile) -> Self {
        Self {
            max_score: 100.0,
            max_time_min: 120.0,
            max_carpark_lots: 100.0,
            penalty_roadwork: 10.0,
            penalty_incident: 20.0,
            weights: profile.weights(),
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("max_score", self.max_score),
            ("max_time_min", self.max_time_min),
            ("max_carpark_lots", self.max_carpark_lots),
        ];
        for (name, v) in positive {
            if !v.is_finite() || v <= 0.0 {
                return Err(EngineError::InvalidConfig(format!("{name} must be > 0 (got {v})")));
            }
        }

        let non_negative = [
            ("penalty_roadwork", self.penalty_roadwork),
            ("penalty_incident", self.penalty_incident),
            ("private.time", self.weights.private.time),
            ("private.incident", self.weights.private.incident),
            ("private.carpark", self.weights.private.carpark),
            ("public.time", self.weights.public.time),
            ("public.incident", self.weights.public.incident),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                return Err(EngineError::InvalidConfig(format!("{name} must be >= 0 (got {v})")));
            }
        }

        let p = self.weights.private;
        let q = self.weights.public;
        check_sum("private weights", p.time + p.incident + p.carpark)?;
        check_sum("public weights", q.time + q.incident)?;
        Ok(())
    }
}

fn check_sum(what: &str, sum: f64) -> EngineResult<()> {
    if (sum - 1.0).abs() > 1e-9 {
        return Err(EngineError::InvalidConfig(format!("{what} must sum to 1 (got {sum})")));
    }
    Ok(())
}

/// Maximum age of a row for it to count as current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalWindows {
    pub traffic: Duration,
    pub parking: Duration,
}

impl Default for SignalWindows {
    fn default() -> Self {
        Self {
            traffic: Duration::hours(1),
            parking: Duration::hours(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankerConfig {
    /// Entries returned by the public-only policy.
    pub public_top_n: usize,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self { public_top_n: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub scoring: ScoringConfig,
    pub windows: SignalWindows,
    pub nearest_carparks: usize,
    pub ranker: RankerConfig,
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            windows: SignalWindows::default(),
            nearest_carparks: 3,
            ranker: RankerConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> EngineResult<()> {
        self.scoring.validate()?;
        if self.windows.traffic <= Duration::zero() || self.windows.parking <= Duration::zero() {
            return Err(EngineError::InvalidConfig(
                "recency windows must be positive".to_string(),
            ));
        }
        if self.nearest_carparks == 0 {
            return Err(EngineError::InvalidConfig(
                "nearest_carparks must be >= 1".to_string(),
            ));
        }
        if self.ranker.public_top_n == 0 {
            return Err(EngineError::InvalidConfig("public_top_n must be >= 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(EngineError::InvalidConfig(
                "retry.max_attempts must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Endpoints and limits of the external collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub db_path: Option<String>,
    pub onemap_url: String,
    pub http_timeout: StdDuration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            onemap_url: DEFAULT_ONEMAP_URL.to_string(),
            http_timeout: StdDuration::from_secs(10),
        }
    }
}

impl ServiceConfig {
    /// Read overrides from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> EngineResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> EngineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(p) = lookup(ENV_DB_PATH).filter(|s| !s.trim().is_empty()) {
            cfg.db_path = Some(p);
        }
        if let Some(u) = lookup(ENV_ONEMAP_URL).filter(|s| !s.trim().is_empty()) {
            cfg.onemap_url = u;
        }
        if let Some(raw) = lookup(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                EngineError::InvalidConfig(format!("{ENV_HTTP_TIMEOUT_SECS}: not an integer: '{raw}'"))
            })?;
            if secs == 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{ENV_HTTP_TIMEOUT_SECS} must be > 0"
                )));
            }
            cfg.http_timeout = StdDuration::from_secs(secs);
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn both_profiles_validate() {
        ScoringConfig::with_profile(WeightProfile::TimeFirst).validate().unwrap();
        ScoringConfig::with_profile(WeightProfile::ParkingAware).validate().unwrap();
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn unbalanced_weights_are_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.private.carpark = 0.4;
        assert!(matches!(cfg.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn service_config_reads_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/tmp/signals.sqlite"),
            (ENV_HTTP_TIMEOUT_SECS, "5"),
        ]);
        let cfg = ServiceConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.db_path.as_deref(), Some("/tmp/signals.sqlite"));
        assert_eq!(cfg.onemap_url, DEFAULT_ONEMAP_URL);
        assert_eq!(cfg.http_timeout, StdDuration::from_secs(5));

        let bad = ServiceConfig::from_lookup(|k| (k == ENV_HTTP_TIMEOUT_SECS).then(|| "x".into()));
        assert!(bad.is_err());
    }
}
