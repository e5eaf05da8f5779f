//! Path and validation extractors for API routes

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

/// Maximum length for catalog ids (dataset, field, panel)
pub const MAX_ID_LENGTH: usize = 64;

/// Validate a catalog id: 1-64 chars, ASCII alphanumeric + underscore
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LENGTH
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Raw path extractor for dataset option routes (internal use)
#[derive(Debug, Deserialize)]
struct OptionPathRaw {
    dataset: String,
    field: String,
}

/// Validated `{dataset}/options/{field}` path.
#[derive(Debug)]
pub struct OptionPath {
    pub dataset: String,
    pub field: String,
}

impl<S> FromRequestParts<S> for OptionPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<OptionPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_id(&raw.dataset) {
            return Err(ValidationRejection::InvalidId("dataset"));
        }
        if !is_valid_id(&raw.field) {
            return Err(ValidationRejection::InvalidId("field"));
        }

        Ok(Self {
            dataset: raw.dataset,
            field: raw.field,
        })
    }
}

/// Raw path extractor for panel routes (internal use)
#[derive(Debug, Deserialize)]
struct PanelPathRaw {
    panel: String,
}

/// Validated `{panel}` path.
#[derive(Debug)]
pub struct PanelPath {
    pub panel: String,
}

impl<S> FromRequestParts<S> for PanelPath
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<PanelPathRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Path)?;

        if !is_valid_id(&raw.panel) {
            return Err(ValidationRejection::InvalidId("panel"));
        }

        Ok(Self { panel: raw.panel })
    }
}

/// Validation rejection with structured error response
pub enum ValidationRejection {
    /// Failed to parse path parameters
    Path(PathRejection),
    /// Path segment is not a valid catalog id
    InvalidId(&'static str),
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::Path(rejection) => (
                StatusCode::BAD_REQUEST,
                "PATH_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::InvalidId(what) => (
                StatusCode::BAD_REQUEST,
                "INVALID_ID",
                format!(
                    "Invalid {}: must be 1-{} alphanumeric chars or underscores",
                    what, MAX_ID_LENGTH
                ),
            ),
            Self::Json(rejection) => (
                StatusCode::BAD_REQUEST,
                "JSON_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Deserializes JSON body and validates it using the `validator` crate.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        assert!(is_valid_id("production"));
        assert!(is_valid_id("product_group"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("org; DROP"));
        assert!(!is_valid_id(&"a".repeat(MAX_ID_LENGTH + 1)));
    }
}
