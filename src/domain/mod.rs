// Domain layer - chart data types and the pure transforms over them
pub mod dashboard;
pub mod distribution;
pub mod field_spec;
pub mod format;
pub mod normalizer;
pub mod range;
pub mod raw;
pub mod time_series;
pub mod warning;
