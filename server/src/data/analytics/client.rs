//! HTTP client for the analytics query service
//!
//! Sends `{ "query": ..., "params": [...] }` to `POST /analytics/execute`
//! and expects a JSON array of row objects back.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{AnalyticsError, MAX_ERROR_BODY};
use super::{PreparedQuery, QueryExecutor, Row};
use crate::core::config::AnalyticsConfig;
use crate::core::constants::ANALYTICS_EXECUTE_PATH;
use crate::utils::retry::retry_with_backoff_async;

const USER_AGENT: &str = concat!("Insight/", env!("CARGO_PKG_VERSION"));

pub struct AnalyticsClient {
    http: reqwest::Client,
    endpoint: String,
    max_attempts: u32,
    retry_base_delay_ms: u64,
}

impl AnalyticsClient {
    pub fn new(config: &AnalyticsConfig) -> Result<Self, AnalyticsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}{}",
                config.url.trim_end_matches('/'),
                ANALYTICS_EXECUTE_PATH
            ),
            max_attempts: config.max_attempts,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn execute_once(&self, query: &PreparedQuery) -> Result<Vec<Row>, AnalyticsError> {
        let resp = self.http.post(&self.endpoint).json(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(AnalyticsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AnalyticsError::Decode(e.to_string()))?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(AnalyticsError::Decode(format!(
                "expected a JSON array of rows, got {}",
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl QueryExecutor for AnalyticsClient {
    async fn execute(&self, query: &PreparedQuery) -> Result<Vec<Row>, AnalyticsError> {
        tracing::debug!(
            sql = %query.sql,
            params = query.params.len(),
            "Executing analytics query"
        );

        let rows = retry_with_backoff_async(
            self.max_attempts,
            self.retry_base_delay_ms,
            AnalyticsError::is_transient,
            || self.execute_once(query),
        )
        .await?;

        tracing::trace!(rows = rows.len(), "Analytics query returned");
        Ok(rows)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
