// Declarative output-field configuration for the normalizer
use serde::Deserialize;
use std::collections::HashSet;

/// Names every chart payload already uses for the point itself.
const RESERVED_NAMES: [&str; 2] = ["date", "label"];

/// How one output field of a normalized series is produced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSpec {
    /// Read from a named source map, following `path` into nested objects.
    Source {
        name: String,
        source: String,
        #[serde(default)]
        path: Vec<String>,
    },
    /// Running total of `of` across the sorted series, starting from 0.
    Cumulative { name: String, of: String },
    /// Difference of `of` to the previous point; the first point keeps its own value.
    Delta { name: String, of: String },
    /// `of` multiplied by the caller-supplied unit multiplier.
    Converted { name: String, of: String },
    /// `numerator / denominator * 100` on the same point, 0 when the denominator is 0.
    Percentage {
        name: String,
        numerator: String,
        denominator: String,
    },
}

impl FieldSpec {
    pub fn source(name: &str, source: &str) -> Self {
        Self::Source {
            name: name.to_string(),
            source: source.to_string(),
            path: Vec::new(),
        }
    }

    pub fn nested(name: &str, source: &str, path: &[&str]) -> Self {
        Self::Source {
            name: name.to_string(),
            source: source.to_string(),
            path: path.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn cumulative(name: &str, of: &str) -> Self {
        Self::Cumulative {
            name: name.to_string(),
            of: of.to_string(),
        }
    }

    pub fn delta(name: &str, of: &str) -> Self {
        Self::Delta {
            name: name.to_string(),
            of: of.to_string(),
        }
    }

    pub fn converted(name: &str, of: &str) -> Self {
        Self::Converted {
            name: name.to_string(),
            of: of.to_string(),
        }
    }

    pub fn percentage(name: &str, numerator: &str, denominator: &str) -> Self {
        Self::Percentage {
            name: name.to_string(),
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Source { name, .. }
            | Self::Cumulative { name, .. }
            | Self::Delta { name, .. }
            | Self::Converted { name, .. }
            | Self::Percentage { name, .. } => name,
        }
    }

    /// Fields this spec reads from the same point.
    fn inputs(&self) -> Vec<&str> {
        match self {
            Self::Source { .. } => Vec::new(),
            Self::Cumulative { of, .. } | Self::Delta { of, .. } | Self::Converted { of, .. } => {
                vec![of.as_str()]
            }
            Self::Percentage {
                numerator,
                denominator,
                ..
            } => vec![numerator.as_str(), denominator.as_str()],
        }
    }
}

/// A misdeclared field list. This is a configuration bug, not bad data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldSpecError {
    #[error("no fields declared")]
    Empty,

    #[error("field name must not be empty")]
    EmptyName,

    #[error("field name '{0}' is reserved")]
    ReservedName(String),

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),

    #[error("field '{field}' reads '{reference}', which is not declared before it")]
    UnknownReference { field: String, reference: String },
}

/// Validated, ordered field list. Derived fields only ever read fields that
/// precede them, so one pass in declaration order computes every value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpecs {
    specs: Vec<FieldSpec>,
}

impl FieldSpecs {
    pub fn new(specs: Vec<FieldSpec>) -> Result<Self, FieldSpecError> {
        if specs.is_empty() {
            return Err(FieldSpecError::Empty);
        }

        let mut declared: HashSet<&str> = HashSet::new();
        for spec in &specs {
            let name = spec.name();
            if name.is_empty() {
                return Err(FieldSpecError::EmptyName);
            }
            if RESERVED_NAMES.contains(&name) {
                return Err(FieldSpecError::ReservedName(name.to_string()));
            }
            for input in spec.inputs() {
                if !declared.contains(input) {
                    return Err(FieldSpecError::UnknownReference {
                        field: name.to_string(),
                        reference: input.to_string(),
                    });
                }
            }
            if !declared.insert(name) {
                return Err(FieldSpecError::DuplicateField(name.to_string()));
            }
        }

        Ok(Self { specs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.name().to_string()).collect()
    }
}
