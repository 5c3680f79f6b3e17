pub mod ranker;
pub mod scorer;

pub use ranker::{RankedReport, RankedRoute, RankingPolicy, rank, rank_mixed, rank_public_only};
pub use scorer::{RouteScorer, ScoreBreakdown};
