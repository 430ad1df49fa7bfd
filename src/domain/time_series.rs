// Time series domain models
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::format::format_display_date;

/// Date-keyed object exactly as delivered by the metrics API. Values are
/// numbers, numeric strings or nested objects of those.
pub type RawDateMap = serde_json::Map<String, serde_json::Value>;

/// Literal date-key format used by one endpoint. Declared per endpoint and
/// never inferred from the key itself, since `01/02/2024` is ambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYear,
    #[serde(rename = "yyyy-MM-dd")]
    YearMonthDay,
}

impl DateFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DayMonthYear => "dd/MM/yyyy",
            Self::YearMonthDay => "yyyy-MM-dd",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            Self::DayMonthYear => "%d/%m/%Y",
            Self::YearMonthDay => "%Y-%m-%d",
        }
    }

    pub fn parse(self, key: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(key.trim(), self.pattern()).ok()
    }

    pub fn render(self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

/// One normalized day. Every point of a series carries the same field names.
#[derive(Debug, Clone, PartialEq)]
pub struct TimePoint {
    pub date: NaiveDate,
    pub label: String,
    pub values: BTreeMap<String, f64>,
}

impl TimePoint {
    pub fn new(date: NaiveDate, values: BTreeMap<String, f64>) -> Self {
        Self {
            date,
            label: format_display_date(date),
            values,
        }
    }

    /// Value of `field`, 0 when the field is not declared on this point.
    pub fn value(&self, field: &str) -> f64 {
        self.values.get(field).copied().unwrap_or(0.0)
    }
}

/// Points ordered by ascending date.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    fields: Vec<String>,
    points: Vec<TimePoint>,
}

impl TimeSeries {
    /// Builds a series, stable-sorting the points by date.
    pub fn new(fields: Vec<String>, mut points: Vec<TimePoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { fields, points }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&TimePoint> {
        self.points.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_day_month_year() {
        assert_eq!(DateFormat::DayMonthYear.parse("04/03/2024"), Some(date(2024, 3, 4)));
        assert_eq!(DateFormat::DayMonthYear.parse("2024-03-04"), None);
        assert_eq!(DateFormat::DayMonthYear.parse("31/02/2024"), None);
    }

    #[test]
    fn test_parse_year_month_day() {
        assert_eq!(DateFormat::YearMonthDay.parse("2024-03-04"), Some(date(2024, 3, 4)));
        assert_eq!(DateFormat::YearMonthDay.parse("04/03/2024"), None);
        assert_eq!(DateFormat::YearMonthDay.parse("not-a-date"), None);
    }

    #[test]
    fn test_render_round_trips_key() {
        assert_eq!(DateFormat::DayMonthYear.render(date(2024, 1, 2)), "02/01/2024");
        assert_eq!(DateFormat::YearMonthDay.render(date(2024, 1, 2)), "2024-01-02");
    }

    #[test]
    fn test_point_label_and_default_value() {
        let point = TimePoint::new(date(2024, 3, 4), BTreeMap::from([("a".to_string(), 1.5)]));
        assert_eq!(point.label, "Mar 4, 2024");
        assert_eq!(point.value("a"), 1.5);
        assert_eq!(point.value("missing"), 0.0);
    }

    #[test]
    fn test_series_sorts_stably() {
        let first = TimePoint::new(date(2024, 1, 2), BTreeMap::from([("a".to_string(), 1.0)]));
        let second = TimePoint::new(date(2024, 1, 1), BTreeMap::new());
        let third = TimePoint::new(date(2024, 1, 2), BTreeMap::from([("a".to_string(), 2.0)]));
        let series = TimeSeries::new(vec!["a".to_string()], vec![first, second, third]);

        let values: Vec<f64> = series.points().iter().map(|p| p.value("a")).collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0]);
        assert_eq!(series.last().map(|p| p.date), Some(date(2024, 1, 2)));
    }
}
