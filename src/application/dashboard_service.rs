// Dashboard service - Builds chart payloads from the metrics API
use crate::application::metrics_repository::MetricsRepository;
use crate::domain::dashboard::{
    ChartData, ChartKind, ChartSummary, DistributionData, StatValue, StatsData,
};
use crate::domain::distribution::{bucket, RawCounts};
use crate::domain::field_spec::FieldSpecs;
use crate::domain::normalizer::{normalize, NamedSource, NormalizeOptions};
use crate::domain::range::{filter, RangeSelection};
use crate::domain::raw::{ranges_to_counts, read_cell, Cell, SourceShape};
use crate::domain::time_series::RawDateMap;
use crate::infrastructure::config::{
    ChartConfig, ChartsConfig, ConfigError, DistributionConfig, DistributionLayout, StatsConfig,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Per-request view settings chosen by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChartQuery {
    /// Falls back to the chart's configured default.
    pub range: Option<RangeSelection>,
    pub unit_multiplier: Option<f64>,
}

#[derive(Debug, Clone)]
struct ChartDefinition {
    config: ChartConfig,
    specs: FieldSpecs,
    shapes: Vec<SourceShape>,
}

#[derive(Clone)]
pub struct DashboardService {
    repository: Arc<dyn MetricsRepository>,
    charts: Arc<Vec<ChartDefinition>>,
    distributions: Arc<Vec<DistributionConfig>>,
    stats: Arc<Vec<StatsConfig>>,
}

impl DashboardService {
    /// Validates the whole catalogue up front so a misdeclared chart stops
    /// startup instead of failing on its first request.
    pub fn new(
        repository: Arc<dyn MetricsRepository>,
        charts_config: ChartsConfig,
    ) -> Result<Self, ConfigError> {
        let mut ids = HashSet::new();
        let mut charts = Vec::with_capacity(charts_config.charts.len());

        for config in charts_config.charts {
            if !ids.insert(config.id.clone()) {
                return Err(ConfigError::DuplicateId(config.id));
            }

            let mut names = HashSet::new();
            let mut shapes = Vec::with_capacity(config.sources.len());
            for source in &config.sources {
                if !names.insert(source.name.as_str()) {
                    return Err(ConfigError::DuplicateSource {
                        chart: config.id.clone(),
                        source_name: source.name.clone(),
                    });
                }
                check_pointer(&config.id, &source.pointer)?;
                shapes.push(source.source_shape(&config.id)?);
            }

            let specs = config.field_specs()?;
            charts.push(ChartDefinition {
                config,
                specs,
                shapes,
            });
        }

        for config in &charts_config.distributions {
            if !ids.insert(config.id.clone()) {
                return Err(ConfigError::DuplicateId(config.id.clone()));
            }
            check_pointer(&config.id, &config.pointer)?;
            match config.layout {
                DistributionLayout::Counts => {}
                DistributionLayout::Ranges => {
                    let frequencies = config
                        .frequencies_pointer
                        .as_deref()
                        .ok_or_else(|| ConfigError::MissingFrequencies(config.id.clone()))?;
                    check_pointer(&config.id, frequencies)?;
                }
                DistributionLayout::Parts => {
                    if config.parts.is_empty() {
                        return Err(ConfigError::MissingParts(config.id.clone()));
                    }
                    for part in &config.parts {
                        check_pointer(&config.id, &part.pointer)?;
                    }
                }
            }
        }

        for config in &charts_config.stats {
            if !ids.insert(config.id.clone()) {
                return Err(ConfigError::DuplicateId(config.id.clone()));
            }
            if config.values.is_empty() {
                return Err(ConfigError::EmptyStats(config.id.clone()));
            }
            for value in &config.values {
                check_pointer(&config.id, &value.pointer)?;
            }
        }

        tracing::info!(
            "Loaded {} charts, {} distributions and {} stat groups",
            charts.len(),
            charts_config.distributions.len(),
            charts_config.stats.len()
        );

        Ok(Self {
            repository,
            charts: Arc::new(charts),
            distributions: Arc::new(charts_config.distributions),
            stats: Arc::new(charts_config.stats),
        })
    }

    pub fn list_charts(&self) -> Vec<ChartSummary> {
        let charts = self.charts.iter().map(|c| ChartSummary {
            id: c.config.id.clone(),
            title: c.config.title.clone(),
            kind: ChartKind::TimeSeries,
        });
        let distributions = self.distributions.iter().map(|d| ChartSummary {
            id: d.id.clone(),
            title: d.title.clone(),
            kind: ChartKind::Distribution,
        });
        let stats = self.stats.iter().map(|s| ChartSummary {
            id: s.id.clone(),
            title: s.title.clone(),
            kind: ChartKind::Stats,
        });
        charts.chain(distributions).chain(stats).collect()
    }

    /// Normalized, range-filtered series for one chart. `Ok(None)` for an
    /// unknown id; `Err` only when no source endpoint could be fetched.
    pub async fn get_chart(
        &self,
        id: &str,
        query: ChartQuery,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<ChartData>> {
        let Some(chart) = self.charts.iter().find(|c| c.config.id == id) else {
            return Ok(None);
        };

        let bodies = self
            .fetch_all(chart.config.sources.iter().map(|s| s.endpoint.as_str()))
            .await;
        if !bodies.is_empty() && bodies.values().all(Option::is_none) {
            anyhow::bail!("No data for chart {}: every upstream request failed", id);
        }

        let mut warnings = Vec::new();
        let maps: Vec<Option<RawDateMap>> = chart
            .config
            .sources
            .iter()
            .zip(&chart.shapes)
            .map(|(source, shape)| {
                let body = bodies.get(source.endpoint.as_str())?.as_ref()?;
                let payload = body.pointer(&source.pointer)?;
                shape.to_date_map(&source.name, payload, &mut warnings)
            })
            .collect();

        let sources: Vec<NamedSource<'_>> = chart
            .config
            .sources
            .iter()
            .zip(&maps)
            .map(|(source, map)| NamedSource::new(&source.name, map.as_ref()))
            .collect();

        let options = NormalizeOptions {
            unit_multiplier: query.unit_multiplier,
        };
        let normalized = normalize(&sources, chart.config.date_format, &chart.specs, &options);
        warnings.extend(normalized.warnings);

        if !warnings.is_empty() {
            tracing::warn!("Chart {} built with {} data warnings", id, warnings.len());
            for warning in &warnings {
                tracing::debug!("Chart {}: {}", id, warning);
            }
        }

        let range = query.range.unwrap_or(chart.config.default_range);
        let points = filter(&normalized.series, range, now).to_vec();
        tracing::debug!(
            "Chart {}: {} of {} points in range {}",
            id,
            points.len(),
            normalized.series.len(),
            range
        );

        Ok(Some(ChartData {
            id: chart.config.id.clone(),
            title: chart.config.title.clone(),
            unit: chart.config.unit.clone(),
            range,
            fields: normalized.series.fields().to_vec(),
            points,
            latest: normalized.series.last().cloned(),
            warnings,
        }))
    }

    /// Bucketed distribution for one chart, collapsed for narrow displays
    /// when `compact` is set and the chart declares a collapse rule.
    pub async fn get_distribution(
        &self,
        id: &str,
        compact: bool,
    ) -> anyhow::Result<Option<DistributionData>> {
        let Some(config) = self.distributions.iter().find(|d| d.id == id) else {
            return Ok(None);
        };

        let body = self
            .repository
            .fetch(&config.endpoint)
            .await
            .with_context(|| format!("Failed to fetch distribution {}", id))?;

        let counts = distribution_counts(config, &body);
        if counts.is_empty() {
            tracing::warn!("Distribution {} has no buckets", id);
        }

        let collapse = if compact { config.collapse.as_ref() } else { None };
        let buckets = bucket(&counts, collapse);

        Ok(Some(DistributionData {
            id: config.id.clone(),
            title: config.title.clone(),
            collapsed: collapse.is_some(),
            buckets,
        }))
    }

    /// Headline figures for one stat group. Values missing from the body
    /// come back as `None` rather than failing the whole group.
    pub async fn get_stats(&self, id: &str) -> anyhow::Result<Option<StatsData>> {
        let Some(config) = self.stats.iter().find(|s| s.id == id) else {
            return Ok(None);
        };

        let body = self
            .repository
            .fetch(&config.endpoint)
            .await
            .with_context(|| format!("Failed to fetch stats {}", id))?;

        let values = config
            .values
            .iter()
            .map(|stat| {
                let value = match body.pointer(&stat.pointer).map(stat_cell) {
                    Some(Cell::Number(v)) => Some(v),
                    _ => {
                        tracing::warn!("Stats {}: no number at {}", id, stat.pointer);
                        None
                    }
                };
                StatValue {
                    name: stat.name.clone(),
                    label: stat.label.clone(),
                    value,
                    decimals: stat.decimals,
                }
            })
            .collect();

        Ok(Some(StatsData {
            id: config.id.clone(),
            title: config.title.clone(),
            unit: config.unit.clone(),
            values,
        }))
    }

    /// Fetches each distinct endpoint once, concurrently. Failures are
    /// logged and come back as `None`.
    async fn fetch_all<'a>(
        &self,
        endpoints: impl Iterator<Item = &'a str>,
    ) -> HashMap<&'a str, Option<Value>> {
        let mut unique: Vec<&'a str> = Vec::new();
        for endpoint in endpoints {
            if !unique.contains(&endpoint) {
                unique.push(endpoint);
            }
        }

        let results = join_all(unique.iter().map(|endpoint| self.repository.fetch(endpoint))).await;

        unique
            .into_iter()
            .zip(results)
            .map(|(endpoint, result)| match result {
                Ok(body) => (endpoint, Some(body)),
                Err(e) => {
                    tracing::warn!("Error fetching endpoint {}: {:#}", endpoint, e);
                    (endpoint, None)
                }
            })
            .collect()
    }
}

fn distribution_counts(config: &DistributionConfig, body: &Value) -> RawCounts {
    match config.layout {
        DistributionLayout::Counts => body
            .pointer(&config.pointer)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default(),
        DistributionLayout::Ranges => {
            let ranges = body.pointer(&config.pointer).unwrap_or(&Value::Null);
            let frequencies = config
                .frequencies_pointer
                .as_deref()
                .and_then(|p| body.pointer(p))
                .unwrap_or(&Value::Null);
            ranges_to_counts(ranges, frequencies)
        }
        DistributionLayout::Parts => config
            .parts
            .iter()
            .map(|part| {
                let value = body.pointer(&part.pointer).cloned().unwrap_or(Value::Null);
                (part.key.clone(), value)
            })
            .collect(),
    }
}

/// Like `read_cell`, also accepting percent strings such as `"12.5%"`.
fn stat_cell(value: &Value) -> Cell {
    match value {
        Value::String(s) => match s.trim().strip_suffix('%') {
            Some(number) => read_cell(&Value::String(number.to_string()), &[]),
            None => read_cell(value, &[]),
        },
        _ => read_cell(value, &[]),
    }
}

fn check_pointer(id: &str, pointer: &str) -> Result<(), ConfigError> {
    if pointer.is_empty() || pointer.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::InvalidPointer {
            id: id.to_string(),
            pointer: pointer.to_string(),
        })
    }
}
