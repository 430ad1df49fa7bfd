// Time-window selection and filtering
use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::time_series::{TimePoint, TimeSeries};

/// Days looked back by `Last30Days`. Two days past the nominal window so at
/// least 30 whole days stay visible whatever the time of day.
pub const TRAILING_WINDOW_DAYS: i64 = 32;

/// Time window a chart is viewed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum RangeSelection {
    Last30Days,
    #[default]
    AllTime,
}

impl RangeSelection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last30Days => "30D",
            Self::AllTime => "All Time",
        }
    }

    /// Trailing window length in days, `None` for the whole series.
    pub fn window_days(self) -> Option<i64> {
        match self {
            Self::Last30Days => Some(TRAILING_WINDOW_DAYS),
            Self::AllTime => None,
        }
    }
}

impl fmt::Display for RangeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown range selection '{0}', expected '30D' or 'All Time'")]
pub struct RangeParseError(pub String);

impl FromStr for RangeSelection {
    type Err = RangeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "30d" | "last30days" => Ok(Self::Last30Days),
            "all" | "alltime" => Ok(Self::AllTime),
            _ => Err(RangeParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for RangeSelection {
    type Error = RangeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Points of `series` inside `selection`, as of `now`.
///
/// `AllTime` hands back every point untouched. `Last30Days` keeps the points
/// dated strictly after `now - 32 days`; the series is sorted, so that is
/// always a suffix and no point is copied or reordered.
pub fn filter(series: &TimeSeries, selection: RangeSelection, now: DateTime<Utc>) -> &[TimePoint] {
    let points = series.points();
    match selection.window_days() {
        None => points,
        Some(days) => {
            let cutoff = now.date_naive() - TimeDelta::days(days);
            let start = points.partition_point(|p| p.date <= cutoff);
            &points[start..]
        }
    }
}
