// Mapper to convert domain models to JSON response types
use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::dashboard::{
    ChartData, ChartKind, ChartSummary, DistributionData, StatValue, StatsData,
};
use crate::domain::distribution::Bucket;
use crate::domain::format::{format_with_decimals, format_without_decimals, INVALID_NUMBER};
use crate::domain::time_series::{DateFormat, TimePoint};
use crate::domain::warning::NormalizeWarning;

#[derive(Debug, Serialize)]
pub struct ChartSummaryJson {
    pub id: String,
    pub title: String,
    pub kind: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ChartJson {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub range: &'static str,
    pub fields: Vec<String>,
    pub points: Vec<PointJson>,
    /// Latest value per field, formatted for the headline cards.
    pub latest: BTreeMap<String, String>,
    pub warnings: Vec<WarningJson>,
}

#[derive(Debug, Serialize)]
pub struct PointJson {
    pub date: String,
    pub label: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
pub struct WarningJson {
    pub kind: &'static str,
    pub source: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DistributionJson {
    pub id: String,
    pub title: String,
    pub collapsed: bool,
    pub total: f64,
    pub total_display: String,
    pub buckets: Vec<BucketJson>,
}

#[derive(Debug, Serialize)]
pub struct BucketJson {
    pub label: String,
    pub range_key: String,
    pub value: f64,
    pub value_display: String,
    pub percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsJson {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub values: Vec<StatValueJson>,
}

#[derive(Debug, Serialize)]
pub struct StatValueJson {
    pub name: String,
    pub label: String,
    pub value: Option<f64>,
    pub display: String,
}

pub fn summary_to_json(summary: ChartSummary) -> ChartSummaryJson {
    let kind = match summary.kind {
        ChartKind::TimeSeries => "time_series",
        ChartKind::Distribution => "distribution",
        ChartKind::Stats => "stats",
    };

    ChartSummaryJson {
        id: summary.id,
        title: summary.title,
        kind,
    }
}

pub fn chart_to_json(chart: ChartData) -> ChartJson {
    let latest = chart
        .latest
        .as_ref()
        .map(|point| {
            point
                .values
                .iter()
                .map(|(field, value)| (field.clone(), format_with_decimals(value)))
                .collect()
        })
        .unwrap_or_default();

    ChartJson {
        id: chart.id,
        title: chart.title,
        unit: chart.unit,
        range: chart.range.as_str(),
        fields: chart.fields,
        points: chart.points.into_iter().map(point_to_json).collect(),
        latest,
        warnings: chart.warnings.iter().map(warning_to_json).collect(),
    }
}

fn point_to_json(point: TimePoint) -> PointJson {
    PointJson {
        date: DateFormat::YearMonthDay.render(point.date),
        label: point.label,
        values: point.values,
    }
}

fn warning_to_json(warning: &NormalizeWarning) -> WarningJson {
    WarningJson {
        kind: warning.kind(),
        source: warning.source_name().to_string(),
        message: warning.to_string(),
    }
}

pub fn distribution_to_json(distribution: DistributionData) -> DistributionJson {
    let total = distribution.buckets.total();

    DistributionJson {
        id: distribution.id,
        title: distribution.title,
        collapsed: distribution.collapsed,
        total,
        total_display: format_without_decimals(&total),
        buckets: distribution
            .buckets
            .buckets()
            .iter()
            .map(bucket_to_json)
            .collect(),
    }
}

fn bucket_to_json(bucket: &Bucket) -> BucketJson {
    BucketJson {
        label: bucket.label.clone(),
        range_key: bucket.range_key.clone(),
        value: bucket.value,
        value_display: format_without_decimals(&bucket.value),
        percentage: bucket.percentage,
    }
}

pub fn stats_to_json(stats: StatsData) -> StatsJson {
    StatsJson {
        id: stats.id,
        title: stats.title,
        unit: stats.unit,
        values: stats.values.into_iter().map(stat_to_json).collect(),
    }
}

fn stat_to_json(stat: StatValue) -> StatValueJson {
    let display = match stat.value {
        Some(v) if stat.decimals => format_with_decimals(&v),
        Some(v) => format_without_decimals(&v),
        None => INVALID_NUMBER.to_string(),
    };

    StatValueJson {
        name: stat.name,
        label: stat.label,
        value: stat.value,
        display,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::range::RangeSelection;
    use chrono::NaiveDate;

    #[test]
    fn test_chart_points_flatten_values() {
        let point = TimePoint::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            BTreeMap::from([("total".to_string(), 1234.5)]),
        );
        let chart = ChartData {
            id: "supply".to_string(),
            title: "Supply".to_string(),
            unit: Some("MOR".to_string()),
            range: RangeSelection::Last30Days,
            fields: vec!["total".to_string()],
            points: vec![point.clone()],
            latest: Some(point),
            warnings: vec![NormalizeWarning::MissingSource {
                source_name: "burnt".to_string(),
            }],
        };

        let json = serde_json::to_value(chart_to_json(chart)).unwrap();
        assert_eq!(json["range"], "30D");
        assert_eq!(
            json["points"][0],
            serde_json::json!({"date": "2024-01-02", "label": "Jan 2, 2024", "total": 1234.5})
        );
        assert_eq!(json["latest"]["total"], "1,234.50");
        assert_eq!(json["warnings"][0]["kind"], "missing_source");
        assert_eq!(json["warnings"][0]["source"], "burnt");
    }

    #[test]
    fn test_empty_chart_has_no_latest() {
        let chart = ChartData {
            id: "empty".to_string(),
            title: "Empty".to_string(),
            unit: None,
            range: RangeSelection::AllTime,
            fields: Vec::new(),
            points: Vec::new(),
            latest: None,
            warnings: Vec::new(),
        };

        let json = chart_to_json(chart);
        assert!(json.latest.is_empty());
        assert!(json.points.is_empty());
    }

    #[test]
    fn test_stat_display_follows_decimals() {
        let stats = StatsData {
            id: "code_metrics".to_string(),
            title: "Code Contributors".to_string(),
            unit: None,
            values: vec![
                StatValue {
                    name: "total".to_string(),
                    label: "Total".to_string(),
                    value: Some(1234.0),
                    decimals: false,
                },
                StatValue {
                    name: "apy".to_string(),
                    label: "APY".to_string(),
                    value: Some(12.5),
                    decimals: true,
                },
                StatValue {
                    name: "missing".to_string(),
                    label: "Missing".to_string(),
                    value: None,
                    decimals: true,
                },
            ],
        };

        let json = serde_json::to_value(stats_to_json(stats)).unwrap();
        assert_eq!(json["values"][0]["display"], "1,234");
        assert_eq!(json["values"][1]["display"], "12.50");
        assert_eq!(json["values"][2]["display"], INVALID_NUMBER);
        assert!(json["values"][2]["value"].is_null());
        assert_eq!(summary_to_json(ChartSummary {
            id: "code_metrics".to_string(),
            title: "Code Contributors".to_string(),
            kind: ChartKind::Stats,
        }).kind, "stats");
    }
}
