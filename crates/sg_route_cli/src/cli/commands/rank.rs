use anyhow::Result;

use sg_route_core::config::RankerConfig;
use sg_route_core::scoring::{RankingPolicy, rank};

use crate::cli::validate::parse_route_arg;

pub fn run(routes: &[String], public_only: bool, top: Option<usize>) -> Result<()> {
    let mut scores = Vec::with_capacity(routes.len());
    let mut is_public = Vec::with_capacity(routes.len());
    for raw in routes {
        let (public, score) = parse_route_arg(raw)?;
        scores.push(score);
        is_public.push(public);
    }

    let mut config = RankerConfig::default();
    if let Some(n) = top {
        config.public_top_n = n;
    }
    let policy = if public_only {
        RankingPolicy::PublicOnly
    } else {
        RankingPolicy::Mixed
    };

    let report = rank(&scores, &is_public, policy, config)?;
    println!("{}", report.summary);
    Ok(())
}
