// Recoverable data-quality anomalies reported alongside normalized output
/// Anomaly found in upstream data. Never aborts a normalization pass; the
/// offending entry is skipped or zeroed and the warning is handed back to the
/// caller so the UI can flag the chart as possibly incomplete.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NormalizeWarning {
    #[error("source '{source_name}': key '{key}' does not match date format {format}")]
    MalformedDateKey {
        source_name: String,
        key: String,
        format: String,
    },

    #[error("source '{source_name}' is missing, treated as all zero")]
    MissingSource { source_name: String },

    #[error("source '{source_name}': value at '{key}' is not a valid number, treated as 0")]
    InvalidNumericValue { source_name: String, key: String },

    #[error("source '{source_name}': key '{key}' repeats an earlier date, ignored")]
    DuplicateDate { source_name: String, key: String },

    #[error("source '{source_name}': row {index} has no usable date")]
    MissingDate { source_name: String, index: usize },
}

impl NormalizeWarning {
    /// Stable machine-readable name of the anomaly.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedDateKey { .. } => "malformed_date_key",
            Self::MissingSource { .. } => "missing_source",
            Self::InvalidNumericValue { .. } => "invalid_numeric_value",
            Self::DuplicateDate { .. } => "duplicate_date",
            Self::MissingDate { .. } => "missing_date",
        }
    }

    pub fn source_name(&self) -> &str {
        match self {
            Self::MalformedDateKey { source_name, .. }
            | Self::MissingSource { source_name }
            | Self::InvalidNumericValue { source_name, .. }
            | Self::DuplicateDate { source_name, .. }
            | Self::MissingDate { source_name, .. } => source_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_source_and_key() {
        let warning = NormalizeWarning::MalformedDateKey {
            source_name: "total_staked".to_string(),
            key: "not-a-date".to_string(),
            format: "dd/MM/yyyy".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "source 'total_staked': key 'not-a-date' does not match date format dd/MM/yyyy"
        );
        assert_eq!(warning.source_name(), "total_staked");
    }

    #[test]
    fn test_kind() {
        let warning = NormalizeWarning::MissingSource {
            source_name: "burnt".to_string(),
        };
        assert_eq!(warning.kind(), "missing_source");
        assert_eq!(warning.source_name(), "burnt");
    }
}
