// Histogram buckets for distribution charts
use serde::Deserialize;

use super::format::abbreviate_thousands;
use super::raw::read_cell;

/// Range key -> count, in the order the API listed them.
pub type RawCounts = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub label: String,
    pub range_key: String,
    pub value: f64,
    /// Share of the series total in hundredths of a percent. Shares of one
    /// series add up to exactly 100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BucketSeries {
    buckets: Vec<Bucket>,
}

impl BucketSeries {
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn total(&self) -> f64 {
        self.buckets.iter().map(|b| b.value).sum()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Narrow-display rule: these range keys fold into one leading bucket.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Collapse {
    pub ranges: Vec<String>,
    pub label: String,
}

/// One bucket per key in input order, optionally folding `collapse.ranges`
/// into a synthetic first bucket keyed `collapse.label`. Percentages are
/// taken against the total of the resulting series.
pub fn bucket(counts: &RawCounts, collapse: Option<&Collapse>) -> BucketSeries {
    let mut entries: Vec<(String, f64)> = counts
        .iter()
        .map(|(key, value)| (key.clone(), read_cell(value, &[]).or_zero()))
        .collect();

    if let Some(rule) = collapse {
        let (folded, kept): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|(key, _)| rule.ranges.contains(key));

        entries = kept;
        if !folded.is_empty() {
            let sum: f64 = folded.iter().map(|(_, value)| value).sum();
            entries.insert(0, (rule.label.clone(), sum));
        }
    }

    let values: Vec<f64> = entries.iter().map(|(_, value)| *value).collect();
    let buckets = entries
        .into_iter()
        .zip(shares_of(&values))
        .map(|((range_key, value), percentage)| Bucket {
            label: format_range_label(&range_key),
            percentage,
            range_key,
            value,
        })
        .collect();

    BucketSeries { buckets }
}

/// `"10000-50000"` -> `"10K - 50K"`, `"10000-Infinity"` -> `"10K+"`.
/// Keys that do not start with a number are shown as they are.
pub fn format_range_label(range_key: &str) -> String {
    let (min, max) = match range_key.split_once('-') {
        Some((min, max)) => (min, Some(max)),
        None => (range_key, None),
    };

    let Ok(min) = min.trim().parse::<f64>() else {
        return range_key.to_string();
    };

    match max.and_then(|m| m.trim().parse::<f64>().ok()) {
        Some(max) if max.is_finite() && max != 0.0 => {
            format!("{} - {}", abbreviate_thousands(min), abbreviate_thousands(max))
        }
        _ => format!("{}+", abbreviate_thousands(min)),
    }
}

/// Percent shares at two decimals, apportioned by largest remainder so the
/// whole series sums to exactly 100. All zeros when the total is zero.
fn shares_of(values: &[f64]) -> Vec<f64> {
    const WHOLE: i64 = 100 * 100;

    let total: f64 = values.iter().sum();
    if total == 0.0 || !total.is_finite() {
        return vec![0.0; values.len()];
    }

    let exact: Vec<f64> = values
        .iter()
        .map(|value| {
            let hundredths = value * WHOLE as f64 / total;
            if hundredths.is_finite() { hundredths } else { 0.0 }
        })
        .collect();
    let mut floored: Vec<i64> = exact.iter().map(|h| h.floor() as i64).collect();

    // negative counts can leave nothing (or too much) to hand out
    let shortfall = WHOLE - floored.iter().sum::<i64>();
    let shortfall = usize::try_from(shortfall).unwrap_or(0).min(values.len());

    let mut by_remainder: Vec<usize> = (0..values.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra)
    });
    for &index in by_remainder.iter().take(shortfall) {
        floored[index] += 1;
    }

    floored.into_iter().map(|h| h as f64 / 100.0).collect()
}
