// Adapters from the API's payload shapes to date-keyed maps
use serde_json::Value;

use super::distribution::RawCounts;
use super::time_series::RawDateMap;
use super::warning::NormalizeWarning;

/// Layout of a date-keyed payload inside an endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceShape {
    /// `{"01/02/2024": 12, ...}` or `{"01/02/2024": {"pool_0": 1, ...}, ...}`
    #[default]
    DateMap,
    /// `[{"date": "01/02/2024", "total_supply": 12, ...}, ...]`
    Records { date_key: String },
    /// `[["01/02/2024", 12], ...]`
    Pairs,
}

impl SourceShape {
    /// Reshapes `value` into a date map. `None` when the payload does not have
    /// the declared shape at all, which callers treat as a missing source.
    pub fn to_date_map(
        &self,
        source_name: &str,
        value: &Value,
        warnings: &mut Vec<NormalizeWarning>,
    ) -> Option<RawDateMap> {
        match self {
            Self::DateMap => value.as_object().cloned(),
            Self::Records { date_key } => {
                let rows = value.as_array()?;
                let mut map = RawDateMap::new();
                for (index, row) in rows.iter().enumerate() {
                    let Some(fields) = row.as_object() else {
                        warnings.push(missing_date(source_name, index));
                        continue;
                    };
                    let Some(date) = fields.get(date_key).and_then(Value::as_str) else {
                        warnings.push(missing_date(source_name, index));
                        continue;
                    };
                    let rest: RawDateMap = fields
                        .iter()
                        .filter(|(k, _)| *k != date_key)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect();
                    insert_once(&mut map, source_name, date, Value::Object(rest), warnings);
                }
                Some(map)
            }
            Self::Pairs => {
                let rows = value.as_array()?;
                let mut map = RawDateMap::new();
                for (index, row) in rows.iter().enumerate() {
                    match row.as_array().map(Vec::as_slice) {
                        Some([Value::String(date), amount, ..]) => {
                            insert_once(&mut map, source_name, date, amount.clone(), warnings);
                        }
                        _ => warnings.push(missing_date(source_name, index)),
                    }
                }
                Some(map)
            }
        }
    }
}

fn missing_date(source_name: &str, index: usize) -> NormalizeWarning {
    NormalizeWarning::MissingDate {
        source_name: source_name.to_string(),
        index,
    }
}

fn insert_once(
    map: &mut RawDateMap,
    source_name: &str,
    date: &str,
    value: Value,
    warnings: &mut Vec<NormalizeWarning>,
) {
    if map.contains_key(date) {
        warnings.push(NormalizeWarning::DuplicateDate {
            source_name: source_name.to_string(),
            key: date.to_string(),
        });
    } else {
        map.insert(date.to_string(), value);
    }
}

/// Result of reading one numeric cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Number(f64),
    /// Key path not present or JSON null; counts as 0 without complaint.
    Absent,
    /// Present but not a finite number; counts as 0 and is reported.
    Invalid,
}

impl Cell {
    pub fn or_zero(self) -> f64 {
        match self {
            Self::Number(v) => v,
            Self::Absent | Self::Invalid => 0.0,
        }
    }
}

/// Follows `path` into nested objects and reads the number found there.
pub fn read_cell(value: &Value, path: &[String]) -> Cell {
    let mut current = value;
    for key in path {
        match current {
            Value::Object(map) => match map.get(key) {
                Some(next) => current = next,
                None => return Cell::Absent,
            },
            Value::Null => return Cell::Absent,
            _ => return Cell::Invalid,
        }
    }

    match current {
        Value::Null => Cell::Absent,
        Value::Number(n) => match n.as_f64() {
            Some(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Invalid,
        },
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Invalid,
        },
        _ => Cell::Invalid,
    }
}

/// Turns parallel `ranges: [[min, max|null], ...]` and `frequencies: [n, ...]`
/// arrays into `"min-max"` keyed counts. An open upper bound becomes `Infinity`.
/// Entries past the shorter array are dropped.
pub fn ranges_to_counts(ranges: &Value, frequencies: &Value) -> RawCounts {
    let (Some(ranges), Some(frequencies)) = (ranges.as_array(), frequencies.as_array()) else {
        return RawCounts::new();
    };

    ranges
        .iter()
        .zip(frequencies)
        .filter_map(|(range, frequency)| {
            let bounds = range.as_array()?;
            let min = bounds.first()?.as_f64()?;
            let max = match bounds.get(1).and_then(Value::as_f64) {
                Some(max) if max.is_finite() => max.to_string(),
                _ => "Infinity".to_string(),
            };
            Some((format!("{}-{}", min, max), frequency.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_date_map_passes_objects_through() {
        let mut warnings = Vec::new();
        let map = SourceShape::DateMap
            .to_date_map("s", &json!({"01/01/2024": 1}), &mut warnings)
            .unwrap();
        assert_eq!(map.get("01/01/2024"), Some(&json!(1)));
        assert!(SourceShape::DateMap.to_date_map("s", &json!([1, 2]), &mut warnings).is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_records_keyed_by_date_field() {
        let payload = json!([
            {"date": "01/01/2024", "total_supply": 100, "circulating_supply": 40},
            {"total_supply": 5},
            {"date": "02/01/2024", "total_supply": "110.5"},
            {"date": "01/01/2024", "total_supply": 1}
        ]);
        let shape = SourceShape::Records {
            date_key: "date".to_string(),
        };
        let mut warnings = Vec::new();
        let map = shape.to_date_map("supply", &payload, &mut warnings).unwrap();

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["01/01/2024", "02/01/2024"]);
        assert_eq!(map["01/01/2024"], json!({"total_supply": 100, "circulating_supply": 40}));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind(), "missing_date");
        assert_eq!(warnings[1].kind(), "duplicate_date");
    }

    #[test]
    fn test_pairs() {
        let payload = json!([["01/01/2024", 1.5], ["02/01/2024", 2.5], [3]]);
        let mut warnings = Vec::new();
        let map = SourceShape::Pairs
            .to_date_map("prices", &payload, &mut warnings)
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["02/01/2024"], json!(2.5));
        assert_eq!(
            warnings,
            vec![NormalizeWarning::MissingDate {
                source_name: "prices".to_string(),
                index: 2,
            }]
        );
    }

    #[test]
    fn test_read_cell() {
        let path = vec!["pool_0".to_string()];
        assert_eq!(read_cell(&json!({"pool_0": 3}), &path), Cell::Number(3.0));
        assert_eq!(read_cell(&json!({"pool_1": 3}), &path), Cell::Absent);
        assert_eq!(read_cell(&json!(7), &path), Cell::Invalid);
        assert_eq!(read_cell(&json!(7), &[]), Cell::Number(7.0));
        assert_eq!(read_cell(&json!("12.5"), &[]), Cell::Number(12.5));
        assert_eq!(read_cell(&json!("NaN"), &[]), Cell::Invalid);
        assert_eq!(read_cell(&json!("abc"), &[]), Cell::Invalid);
        assert_eq!(read_cell(&json!(null), &[]), Cell::Absent);
        assert_eq!(Cell::Invalid.or_zero(), 0.0);
    }

    #[test]
    fn test_ranges_to_counts() {
        let counts = ranges_to_counts(
            &json!([[0, 1], [1, 2], [2, null]]),
            &json!([10, 20, 5]),
        );
        let entries: Vec<(&String, &Value)> = counts.iter().collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], (&"0-1".to_string(), &json!(10)));
        assert_eq!(entries[2], (&"2-Infinity".to_string(), &json!(5)));
    }
}
