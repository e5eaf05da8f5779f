//! Analytics query service transport
//!
//! The dashboard never talks to the analytics engine directly; every chart
//! query goes through a [`QueryExecutor`]. The production implementation is
//! [`AnalyticsClient`], which forwards prepared statements over HTTP.

mod client;
mod error;

use async_trait::async_trait;
use serde::Serialize;

use crate::data::filters::SqlParam;

pub use client::AnalyticsClient;
pub use error::AnalyticsError;

/// A result row as returned by the query service
pub type Row = serde_json::Value;

/// SQL text with `?` placeholders plus its bound parameters.
///
/// Serializes to the query service's request body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PreparedQuery {
    #[serde(rename = "query")]
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Executes prepared queries against the analytics engine
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &PreparedQuery) -> Result<Vec<Row>, AnalyticsError>;
}
