// Display formatting shared by chart payloads. Output only, never fed back
// into arithmetic or comparisons.
use chrono::NaiveDate;
use num_format::Locale;

pub const INVALID_NUMBER: &str = "Invalid number";

/// Anything the dashboard may be asked to print as a number.
pub trait AsNumber {
    /// Finite numeric value, `None` when the input is not a usable number.
    fn as_number(&self) -> Option<f64>;
}

impl AsNumber for f64 {
    fn as_number(&self) -> Option<f64> {
        self.is_finite().then_some(*self)
    }
}

impl AsNumber for i64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl AsNumber for str {
    fn as_number(&self) -> Option<f64> {
        self.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl AsNumber for String {
    fn as_number(&self) -> Option<f64> {
        self.as_str().as_number()
    }
}

impl AsNumber for serde_json::Value {
    fn as_number(&self) -> Option<f64> {
        match self {
            serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            serde_json::Value::String(s) => s.as_number(),
            _ => None,
        }
    }
}

/// Thousands-grouped with exactly two decimals, e.g. `1,234.50`.
pub fn format_with_decimals<N: AsNumber + ?Sized>(value: &N) -> String {
    match value.as_number() {
        Some(v) => group_thousands(v, 2),
        None => INVALID_NUMBER.to_string(),
    }
}

/// Thousands-grouped without decimals, e.g. `1,235`.
pub fn format_without_decimals<N: AsNumber + ?Sized>(value: &N) -> String {
    match value.as_number() {
        Some(v) => group_thousands(v, 0),
        None => INVALID_NUMBER.to_string(),
    }
}

/// Axis/tooltip date label, e.g. `Mar 4, 2024`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Short form for range bounds: values from 1000 up print as whole thousands.
pub fn abbreviate_thousands(value: f64) -> String {
    if value >= 1000.0 {
        format!("{}K", (value / 1000.0).round())
    } else {
        value.to_string()
    }
}

fn group_thousands(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (rendered.as_str(), None),
    };

    let grouped = group_digits(int_part, Locale::en.separator());

    // "-0.00" only when something non-zero survives rounding
    let negative = value < 0.0 && rendered.bytes().any(|b| (b'1'..=b'9').contains(&b));

    let mut out = String::with_capacity(grouped.len() + decimals + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Inserts `separator` every three digits from the right. Works on the
/// rendered digits so magnitudes past any integer type still group.
fn group_digits(digits: &str, separator: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_decimals() {
        assert_eq!(format_with_decimals(&1234.5), "1,234.50");
        assert_eq!(format_with_decimals(&0.0), "0.00");
        assert_eq!(format_with_decimals(&1234567.891), "1,234,567.89");
        assert_eq!(format_with_decimals(&-9876.5), "-9,876.50");
        assert_eq!(format_with_decimals(&-0.001), "0.00");
    }

    #[test]
    fn test_format_without_decimals() {
        assert_eq!(format_without_decimals(&1234.4), "1,234");
        assert_eq!(format_without_decimals(&999.0), "999");
        assert_eq!(format_without_decimals(&42_000_i64), "42,000");
    }

    #[test]
    fn test_numeric_strings_are_accepted() {
        assert_eq!(format_with_decimals("2500.126"), "2,500.13");
        assert_eq!(format_without_decimals(&serde_json::json!("12000")), "12,000");
        assert_eq!(format_with_decimals(&serde_json::json!(3)), "3.00");
    }

    #[test]
    fn test_groups_values_beyond_u64() {
        assert_eq!(
            format_with_decimals(&18446744073709551616.0),
            "18,446,744,073,709,551,616.00"
        );
        assert_eq!(
            format_with_decimals(&1e25),
            "10,000,000,000,000,000,905,969,664.00"
        );
        assert_eq!(format_without_decimals(&-1e21), "-1,000,000,000,000,000,000,000");
        assert_eq!(format_without_decimals(&12.0), "12");
    }

    #[test]
    fn test_invalid_input_renders_sentinel() {
        assert_eq!(format_with_decimals(&f64::NAN), INVALID_NUMBER);
        assert_eq!(format_with_decimals(&f64::INFINITY), INVALID_NUMBER);
        assert_eq!(format_with_decimals("Invalid number"), INVALID_NUMBER);
        assert_eq!(format_without_decimals(&serde_json::Value::Null), INVALID_NUMBER);
    }

    #[test]
    fn test_format_display_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(format_display_date(date), "Mar 4, 2024");
    }

    #[test]
    fn test_abbreviate_thousands() {
        assert_eq!(abbreviate_thousands(10000.0), "10K");
        assert_eq!(abbreviate_thousands(1500.0), "2K");
        assert_eq!(abbreviate_thousands(999.0), "999");
        assert_eq!(abbreviate_thousands(0.5), "0.5");
    }
}
