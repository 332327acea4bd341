use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::foundation::error::{PlotError, PlotResult};

/// How often a plot is regenerated; governs the granularity of its dated output path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Regenerated once a week.
    Weekly,
    /// Regenerated once a day.
    Daily,
    /// Regenerated once an hour.
    Hourly,
}

impl Frequency {
    /// Truncate `t` to the granularity used for artifact placement.
    ///
    /// Weekly plots share the daily granularity: their dated path is day-grained.
    pub fn truncate_for_path(self, t: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Weekly | Self::Daily => start_of_day(t),
            Self::Hourly => start_of_hour(t),
        }
    }

    /// Number of dated path components below the year (`MM/DD` or `MM/DD/HH`).
    pub(crate) fn dated_depth(self) -> usize {
        match self {
            Self::Weekly | Self::Daily => 2,
            Self::Hourly => 3,
        }
    }

    pub(crate) fn dated_format(self) -> &'static str {
        match self {
            Self::Weekly | Self::Daily => "%Y/%m/%d",
            Self::Hourly => "%Y/%m/%d/%H",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn start_of_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(t.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    t.date_naive().and_time(time).and_utc()
}

pub fn start_of_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Midnight of the Monday starting the week containing `t`.
pub fn start_of_week(t: DateTime<Utc>) -> DateTime<Utc> {
    let back = i64::from(t.weekday().num_days_from_monday());
    start_of_day(t) - TimeDelta::days(back)
}

/// Format a timestamp the way every output and key projection expects it.
pub fn format_rfc3339(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

static BASIS_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-(\d+)([hdw])$").unwrap_or_else(|e| panic!("basis offset regex: {e}"))
});

/// Resolve a basis-time expression relative to `now`.
///
/// Accepts `now`, an offset into the past (`-2h`, `-4d`, `-1w`), a Unix timestamp in
/// seconds, or an RFC 3339 timestamp. Absolute times in the future are rejected.
pub fn parse_basis(expr: &str, now: DateTime<Utc>) -> PlotResult<DateTime<Utc>> {
    let expr = expr.trim();
    if expr == "now" {
        return Ok(now);
    }

    if let Some(caps) = BASIS_OFFSET.captures(expr) {
        let n: i64 = caps[1]
            .parse()
            .map_err(|e| PlotError::configuration(format!("invalid basis offset value: {e}")))?;
        let per_unit = match &caps[2] {
            "h" => 1,
            "d" => 24,
            "w" => 24 * 7,
            unit => {
                return Err(PlotError::configuration(format!(
                    "invalid basis offset unit: {unit:?}"
                )));
            }
        };
        return n
            .checked_mul(per_unit)
            .and_then(TimeDelta::try_hours)
            .and_then(|offset| now.checked_sub_signed(offset))
            .ok_or_else(|| PlotError::configuration(format!("basis offset out of range: {expr}")));
    }

    let basis = match expr.parse::<i64>() {
        Ok(secs) => DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| PlotError::configuration(format!("invalid unix timestamp: {secs}")))?,
        Err(_) => DateTime::parse_from_rfc3339(expr)
            .map_err(|e| PlotError::configuration(format!("invalid basis time {expr:?}: {e}")))?
            .with_timezone(&Utc),
    };

    if basis > now {
        return Err(PlotError::configuration(format!(
            "basis time should not be in the future: {}",
            format_rfc3339(basis)
        )));
    }
    Ok(basis)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
