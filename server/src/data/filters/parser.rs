//! Filter parsing
//!
//! Parses JSON filter definitions into a [`FilterSpec`] with size limits.

use thiserror::Error;

use super::types::FilterSpec;

/// Maximum size of filter JSON in bytes (64KB)
pub const MAX_FILTER_JSON_SIZE: usize = 64 * 1024;

/// Maximum number of predicates allowed
pub const MAX_FILTERS: usize = 50;

#[derive(Error, Debug)]
pub enum FilterParseError {
    #[error("Filter JSON exceeds maximum size of {} bytes", MAX_FILTER_JSON_SIZE)]
    TooLarge,

    #[error("Maximum {} filters allowed", MAX_FILTERS)]
    TooMany,

    #[error("Invalid filter JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FilterParseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::TooLarge => "FILTER_JSON_TOO_LARGE",
            Self::TooMany => "TOO_MANY_FILTERS",
            Self::Json(_) => "INVALID_FILTER_JSON",
        }
    }
}

/// Parse a filter spec from JSON text
///
/// Only shape and size are checked here; field names and values are
/// validated by the compiler against a dataset schema.
pub fn parse_filters(json_str: &str) -> Result<FilterSpec, FilterParseError> {
    if json_str.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterParseError::TooLarge);
    }

    let spec: FilterSpec = serde_json::from_str(json_str)?;

    if spec.len() > MAX_FILTERS {
        return Err(FilterParseError::TooMany);
    }

    Ok(spec)
}
