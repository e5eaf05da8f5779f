//! Shared API types
//!
//! Error responses are rendered as `{ "error", "code", "message" }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::analytics::AnalyticsError;
use crate::data::filters::{CompileError, FilterParseError};
use crate::domain::DispatchError;

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    BadGateway { message: String },
    ServiceUnavailable { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn from_compile(e: CompileError) -> Self {
        tracing::warn!(error = %e, "Rejected filter");
        Self::bad_request(e.code(), e.to_string())
    }

    pub fn from_filter_parse(e: FilterParseError) -> Self {
        tracing::debug!(error = %e, "Malformed filters");
        Self::bad_request(e.code(), e.to_string())
    }

    pub fn from_dispatch(e: DispatchError) -> Self {
        match e {
            DispatchError::Superseded(slot) => Self::conflict(
                "SUPERSEDED",
                format!("Query on slot '{}' was superseded by a newer request", slot),
            ),
            DispatchError::ShuttingDown => Self::service_unavailable("Server is shutting down"),
            DispatchError::Analytics(e) => Self::from_analytics(&e),
        }
    }

    fn from_analytics(e: &AnalyticsError) -> Self {
        tracing::error!(error = %e, "Analytics query failed");
        match e {
            AnalyticsError::Http(_) if e.is_transient() => {
                Self::service_unavailable("Analytics service is unreachable")
            }
            AnalyticsError::Status { .. } | AnalyticsError::Decode(_) | AnalyticsError::Http(_) => {
                Self::BadGateway {
                    message: "Analytics query failed".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, "not_found", code, message),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, "conflict", code, message),
            Self::BadGateway { message } => (
                StatusCode::BAD_GATEWAY,
                "bad_gateway",
                "ANALYTICS_ERROR".to_string(),
                message,
            ),
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn compile_errors_are_bad_requests() {
        let err = ApiError::from_compile(CompileError::UnknownField {
            field: "region".to_string(),
        });
        assert!(matches!(
            err,
            ApiError::BadRequest { ref code, .. } if code == "UNKNOWN_FILTER_FIELD"
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn superseded_is_conflict() {
        let err = ApiError::from_dispatch(DispatchError::Superseded("s".to_string()));
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn upstream_status_is_bad_gateway() {
        let err = ApiError::from_dispatch(DispatchError::Analytics(Arc::new(
            AnalyticsError::Status {
                status: 500,
                body: "boom".to_string(),
            },
        )));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn shutting_down_is_unavailable() {
        let err = ApiError::from_dispatch(DispatchError::ShuttingDown);
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
