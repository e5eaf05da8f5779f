//! Data layer
//!
//! - `filters` - filter model, allow-list schemas and the predicate compiler
//! - `datasets` - catalog of queryable tables
//! - `analytics` - client for the remote SQL query service

pub mod analytics;
pub mod datasets;
pub mod filters;
