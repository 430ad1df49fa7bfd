// Chart payload domain models
use super::distribution::BucketSeries;
use super::range::RangeSelection;
use super::time_series::TimePoint;
use super::warning::NormalizeWarning;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartKind {
    TimeSeries,
    Distribution,
    Stats,
}

/// Catalogue entry shown in the chart list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSummary {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub range: RangeSelection,
    pub fields: Vec<String>,
    pub points: Vec<TimePoint>,
    /// Newest point of the unfiltered series, for the headline figures.
    pub latest: Option<TimePoint>,
    pub warnings: Vec<NormalizeWarning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionData {
    pub id: String,
    pub title: String,
    pub collapsed: bool,
    pub buckets: BucketSeries,
}

/// One headline figure. `None` when the body had no usable number there.
#[derive(Debug, Clone, PartialEq)]
pub struct StatValue {
    pub name: String,
    pub label: String,
    pub value: Option<f64>,
    pub decimals: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub values: Vec<StatValue>,
}
