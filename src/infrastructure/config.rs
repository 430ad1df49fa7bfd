use serde::Deserialize;

use crate::domain::distribution::Collapse;
use crate::domain::field_spec::{FieldSpec, FieldSpecError, FieldSpecs};
use crate::domain::range::RangeSelection;
use crate::domain::raw::SourceShape;
use crate::domain::time_series::DateFormat;

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub api: ApiSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartsConfig {
    #[serde(default)]
    pub charts: Vec<ChartConfig>,
    #[serde(default)]
    pub distributions: Vec<DistributionConfig>,
    #[serde(default)]
    pub stats: Vec<StatsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChartConfig {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub date_format: DateFormat,
    #[serde(default)]
    pub default_range: RangeSelection,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub name: String,
    pub endpoint: String,
    /// JSON pointer into the endpoint body, e.g. `/daily_unique_stakers`.
    #[serde(default)]
    pub pointer: String,
    #[serde(default)]
    pub shape: ShapeKind,
    pub date_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    #[default]
    DateMap,
    Records,
    Pairs,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DistributionConfig {
    pub id: String,
    pub title: String,
    pub endpoint: String,
    #[serde(default)]
    pub layout: DistributionLayout,
    /// Counts object for `counts`, the ranges array for `ranges`.
    #[serde(default)]
    pub pointer: String,
    /// Frequencies array, `ranges` layout only.
    pub frequencies_pointer: Option<String>,
    /// Named slices read from anywhere in the body, `parts` layout only.
    #[serde(default)]
    pub parts: Vec<PartConfig>,
    pub collapse: Option<Collapse>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PartConfig {
    pub key: String,
    pub pointer: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistributionLayout {
    #[default]
    Counts,
    Ranges,
    Parts,
}

/// Headline figures read straight from one endpoint body.
#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub endpoint: String,
    pub values: Vec<StatConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatConfig {
    pub name: String,
    pub label: String,
    pub pointer: String,
    /// Two decimals when set, whole numbers otherwise.
    #[serde(default)]
    pub decimals: bool,
}

/// Chart catalogue that cannot be served as written.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("chart '{chart}': {source}")]
    InvalidFields {
        chart: String,
        #[source]
        source: FieldSpecError,
    },

    #[error("chart '{chart}': source '{source_name}' uses the records shape but has no date_key")]
    MissingDateKey { chart: String, source_name: String },

    #[error("chart '{chart}': source '{source_name}' is declared more than once")]
    DuplicateSource { chart: String, source_name: String },

    #[error("'{id}': pointer '{pointer}' must be empty or start with '/'")]
    InvalidPointer { id: String, pointer: String },

    #[error("distribution '{0}' uses the ranges layout but has no frequencies_pointer")]
    MissingFrequencies(String),

    #[error("distribution '{0}' uses the parts layout but declares no parts")]
    MissingParts(String),

    #[error("stats '{0}' declares no values")]
    EmptyStats(String),

    #[error("id '{0}' is used by more than one chart")]
    DuplicateId(String),
}

impl ChartConfig {
    pub fn field_specs(&self) -> Result<FieldSpecs, ConfigError> {
        FieldSpecs::new(self.fields.clone()).map_err(|source| ConfigError::InvalidFields {
            chart: self.id.clone(),
            source,
        })
    }
}

impl SourceConfig {
    pub fn source_shape(&self, chart: &str) -> Result<SourceShape, ConfigError> {
        match (self.shape, &self.date_key) {
            (ShapeKind::DateMap, _) => Ok(SourceShape::DateMap),
            (ShapeKind::Pairs, _) => Ok(SourceShape::Pairs),
            (ShapeKind::Records, Some(date_key)) => Ok(SourceShape::Records {
                date_key: date_key.clone(),
            }),
            (ShapeKind::Records, None) => Err(ConfigError::MissingDateKey {
                chart: chart.to_string(),
                source_name: self.name.clone(),
            }),
        }
    }
}

pub fn load_api_config() -> anyhow::Result<ApiConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/api"))
        .add_source(config::Environment::with_prefix("METRICS_DASHBOARD").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

pub fn load_charts_config() -> anyhow::Result<ChartsConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/charts"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
