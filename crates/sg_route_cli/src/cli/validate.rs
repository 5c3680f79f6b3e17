use anyhow::{Result, bail};
use chrono::NaiveDateTime;

/// `--top` only shapes the public-only listing; the mixed report is fixed.
pub fn validate_top(top: Option<usize>, public_only: bool) -> Result<()> {
    if top == Some(0) {
        bail!("--top must be > 0.");
    }
    if top.is_some() && !public_only {
        bail!("--top only applies with --public-only.");
    }
    Ok(())
}

/// Parse `--at`, with or without seconds.
pub fn parse_at(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    bail!("Invalid --at value '{raw}' (expected \"YYYY-MM-DD HH:MM\")")
}

/// Parse one `--route MODE:SCORE` argument into (is_public, score).
pub fn parse_route_arg(raw: &str) -> Result<(bool, f64)> {
    let Some((mode, score)) = raw.split_once(':') else {
        bail!("Invalid --route '{raw}' (expected MODE:SCORE, e.g. private:90)");
    };

    let is_public = match mode.trim().to_ascii_lowercase().as_str() {
        "public" | "pt" => true,
        "private" | "car" => false,
        other => bail!("Invalid route mode '{other}' (expected private or public)"),
    };

    let score: f64 = match score.trim().parse() {
        Ok(v) => v,
        Err(_) => bail!("Invalid score in --route '{raw}'"),
    };
    if !score.is_finite() {
        bail!("Score must be a finite number in --route '{raw}'");
    }

    Ok((is_public, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_needs_public_only() {
        assert!(validate_top(None, false).is_ok());
        assert!(validate_top(Some(5), true).is_ok());
        assert!(validate_top(Some(5), false).is_err());
        assert!(validate_top(Some(0), true).is_err());
    }

    #[test]
    fn route_args() {
        assert_eq!(parse_route_arg("private:90").unwrap(), (false, 90.0));
        assert_eq!(parse_route_arg("Public: 60.5").unwrap(), (true, 60.5));
        assert!(parse_route_arg("bus:60").is_err());
        assert!(parse_route_arg("private").is_err());
        assert!(parse_route_arg("private:NaN").is_err());
    }

    #[test]
    fn at_formats() {
        assert!(parse_at("2024-03-05 08:30").is_ok());
        assert!(parse_at("2024-03-05T08:30:15").is_ok());
        assert!(parse_at("05/03 08:30").is_err());
    }
}
