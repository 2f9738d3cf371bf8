//! Downloader progress line parsing.
//!
//! The downloader is run with a fixed progress template (see
//! [`PROGRESS_TEMPLATE`](super::ytdlp::PROGRESS_TEMPLATE)) so each progress
//! line looks like `at:1.2MiB/s eta:00:05 per:42.0%`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static PERCENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"per:\s*([\d.]+)%").expect("valid percent regex"));

static STATS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at:(\S+)\s+eta:(\S+)").expect("valid stats regex"));

/// One parsed progress triple. `speed` and `eta` may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub percent: String,
    pub speed: String,
    pub eta: String,
}

/// Raw fields found on a line, each matched independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressFields {
    pub percent: Option<String>,
    pub speed: Option<String>,
    pub eta: Option<String>,
}

/// Extract whatever progress fields a line carries.
pub fn parse_fields(line: &str) -> ProgressFields {
    let percent = PERCENT_REGEX
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let (speed, eta) = match STATS_REGEX.captures(line) {
        Some(c) => (
            c.get(1).map(|m| m.as_str().to_string()),
            c.get(2).map(|m| m.as_str().to_string()),
        ),
        None => (None, None),
    };

    ProgressFields {
        percent,
        speed,
        eta,
    }
}

/// Parse a line into a progress sample.
///
/// Only lines carrying a percent produce a sample; speed/eta-only lines and
/// unrelated chatter are dropped.
pub fn parse_progress(line: &str) -> Option<ProgressSample> {
    let fields = parse_fields(line);
    let percent = fields.percent.filter(|p| !p.is_empty())?;
    Some(ProgressSample {
        percent,
        speed: fields.speed.unwrap_or_default(),
        eta: fields.eta.unwrap_or_default(),
    })
}
