// Merges date-keyed source maps into one sorted, zero-filled series
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::field_spec::{FieldSpec, FieldSpecs};
use super::raw::{read_cell, Cell};
use super::time_series::{DateFormat, RawDateMap, TimePoint, TimeSeries};
use super::warning::NormalizeWarning;

/// One input map and the name field specs refer to it by. `data: None`
/// stands for a sub-object the API left out of its response.
#[derive(Debug, Clone, Copy)]
pub struct NamedSource<'a> {
    pub name: &'a str,
    pub data: Option<&'a RawDateMap>,
}

impl<'a> NamedSource<'a> {
    pub fn new(name: &'a str, data: Option<&'a RawDateMap>) -> Self {
        Self { name, data }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizeOptions {
    /// Factor for `Converted` fields, e.g. the stETH price in USD. `None`
    /// leaves converted fields in their source unit; 0 means the price is
    /// unknown and yields 0.
    pub unit_multiplier: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Normalized {
    pub series: TimeSeries,
    pub warnings: Vec<NormalizeWarning>,
}

/// Source cells contributing to one date: source name -> (original key, value).
type Row<'a> = HashMap<&'a str, (&'a str, &'a Value)>;

/// Builds one point per date found in any source, sorted ascending, with
/// every declared field present. Bad keys and values are skipped or zeroed
/// and reported in `warnings`; nothing in the data can make this fail.
pub fn normalize(
    sources: &[NamedSource<'_>],
    format: DateFormat,
    specs: &FieldSpecs,
    options: &NormalizeOptions,
) -> Normalized {
    if sources.is_empty() {
        return Normalized {
            series: TimeSeries::new(specs.names(), Vec::new()),
            warnings: Vec::new(),
        };
    }

    let mut warnings = missing_sources(sources, specs);
    let rows = merge_rows(sources, format, &mut warnings);

    let mut running: HashMap<&str, f64> = HashMap::new();
    let mut previous: HashMap<&str, f64> = HashMap::new();
    let mut points = Vec::with_capacity(rows.len());

    for (date, row) in rows {
        let mut values: BTreeMap<String, f64> = BTreeMap::new();

        for spec in specs.iter() {
            let value = match spec {
                FieldSpec::Source { source, path, .. } => match row.get(source.as_str()) {
                    Some((key, raw)) => match read_cell(raw, path) {
                        Cell::Number(v) => v,
                        Cell::Absent => 0.0,
                        Cell::Invalid => {
                            warnings.push(NormalizeWarning::InvalidNumericValue {
                                source_name: source.clone(),
                                key: key.to_string(),
                            });
                            0.0
                        }
                    },
                    None => 0.0,
                },
                FieldSpec::Cumulative { name, of } => {
                    let total = running.entry(name.as_str()).or_insert(0.0);
                    *total += field(&values, of);
                    *total
                }
                FieldSpec::Delta { name, of } => {
                    let current = field(&values, of);
                    let before = previous.insert(name.as_str(), current).unwrap_or(0.0);
                    current - before
                }
                FieldSpec::Converted { of, .. } => match options.unit_multiplier {
                    Some(multiplier) => field(&values, of) * multiplier,
                    None => field(&values, of),
                },
                FieldSpec::Percentage {
                    numerator,
                    denominator,
                    ..
                } => percentage_of(field(&values, numerator), field(&values, denominator)),
            };

            values.insert(spec.name().to_string(), finite_or_zero(value));
        }

        points.push(TimePoint::new(date, values));
    }

    Normalized {
        series: TimeSeries::new(specs.names(), points),
        warnings,
    }
}

/// `part / whole * 100`, 0 when `whole` is 0.
pub fn percentage_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        finite_or_zero(part / whole * 100.0)
    }
}

fn field(values: &BTreeMap<String, f64>, name: &str) -> f64 {
    values.get(name).copied().unwrap_or(0.0)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Absent payloads and sources that specs name but no input provides.
fn missing_sources(sources: &[NamedSource<'_>], specs: &FieldSpecs) -> Vec<NormalizeWarning> {
    let mut reported: HashSet<&str> = HashSet::new();
    let mut warnings = Vec::new();

    for source in sources {
        if source.data.is_none() && reported.insert(source.name) {
            warnings.push(NormalizeWarning::MissingSource {
                source_name: source.name.to_string(),
            });
        }
    }

    let provided: HashSet<&str> = sources.iter().map(|s| s.name).collect();
    for spec in specs.iter() {
        if let FieldSpec::Source { source, .. } = spec {
            if !provided.contains(source.as_str()) && reported.insert(source.as_str()) {
                warnings.push(NormalizeWarning::MissingSource {
                    source_name: source.clone(),
                });
            }
        }
    }

    warnings
}

/// Union of parsed dates over all sources, in first-seen order, then
/// stable-sorted by date. Same-date cells from different sources share a row.
fn merge_rows<'a>(
    sources: &[NamedSource<'a>],
    format: DateFormat,
    warnings: &mut Vec<NormalizeWarning>,
) -> Vec<(NaiveDate, Row<'a>)> {
    let mut rows: Vec<(NaiveDate, Row<'a>)> = Vec::new();
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();

    for source in sources {
        let Some(data) = source.data else {
            continue;
        };

        for (key, value) in data {
            let Some(date) = format.parse(key) else {
                warnings.push(NormalizeWarning::MalformedDateKey {
                    source_name: source.name.to_string(),
                    key: key.clone(),
                    format: format.as_str().to_string(),
                });
                continue;
            };

            let slot = *index.entry(date).or_insert_with(|| {
                rows.push((date, Row::new()));
                rows.len() - 1
            });
            let row = &mut rows[slot].1;

            if row.contains_key(source.name) {
                warnings.push(NormalizeWarning::DuplicateDate {
                    source_name: source.name.to_string(),
                    key: key.clone(),
                });
            } else {
                row.insert(source.name, (key.as_str(), value));
            }
        }
    }

    rows.sort_by_key(|(date, _)| *date);
    rows
}
