//! Filter compilation endpoint

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::{QueryApiState, compile_for, validate_filter_count};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::data::filters::{CompiledFilter, FilterSpec, Predicate};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CompileRequest {
    #[validate(length(min = 1, max = 64))]
    pub dataset: String,
    #[serde(default)]
    #[validate(custom(function = "validate_filter_count"))]
    #[schema(value_type = Vec<Predicate>)]
    pub filters: FilterSpec,
}

/// Compile a filter set into a parameterized clause without executing it
#[utoipa::path(
    post,
    path = "/api/v1/filters/compile",
    tag = "filters",
    request_body = CompileRequest,
    responses(
        (status = 200, description = "Compiled clause and parameters", body = CompiledFilter),
        (status = 400, description = "Filter rejected by the dataset schema"),
        (status = 404, description = "Unknown dataset")
    )
)]
pub async fn compile_filters(
    State(state): State<QueryApiState>,
    ValidatedJson(req): ValidatedJson<CompileRequest>,
) -> Result<Json<CompiledFilter>, ApiError> {
    let dataset = state.dataset(&req.dataset)?;
    Ok(Json(compile_for(dataset, req.filters)?))
}
