//! Dashboard panel endpoints

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::{QueryApiState, compile_for, validate_filter_count};
use crate::api::extractors::{PanelPath, ValidatedJson};
use crate::api::types::ApiError;
use crate::data::filters::{FilterSpec, Predicate};
use crate::domain::{builtin_panels, find_panel};

#[derive(Debug, Serialize, ToSchema)]
pub struct PanelDto {
    pub id: String,
    pub dataset: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PanelsResponse {
    pub panels: Vec<PanelDto>,
}

/// List available dashboard panels
#[utoipa::path(
    get,
    path = "/api/v1/panels",
    tag = "panels",
    responses(
        (status = 200, description = "Panel catalog", body = PanelsResponse)
    )
)]
pub async fn list_panels() -> Json<PanelsResponse> {
    let panels = builtin_panels()
        .iter()
        .map(|p| PanelDto {
            id: p.id.to_string(),
            dataset: p.dataset.to_string(),
        })
        .collect();
    Json(PanelsResponse { panels })
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PanelQueryRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_filter_count"))]
    #[schema(value_type = Vec<Predicate>)]
    pub filters: FilterSpec,
    /// Client session id. A newer query for the same session and panel
    /// supersedes an older one still in flight.
    #[validate(length(min = 1, max = 128))]
    pub slot: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PanelQueryResponse {
    pub panel: String,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<serde_json::Value>,
}

/// Run a panel query with the given filters
#[utoipa::path(
    post,
    path = "/api/v1/panels/{panel}/query",
    tag = "panels",
    params(
        ("panel" = String, Path, description = "Panel id")
    ),
    request_body = PanelQueryRequest,
    responses(
        (status = 200, description = "Panel rows", body = PanelQueryResponse),
        (status = 400, description = "Filter rejected by the dataset schema"),
        (status = 404, description = "Unknown panel"),
        (status = 409, description = "Superseded by a newer query on the same slot"),
        (status = 502, description = "Analytics service error")
    )
)]
pub async fn query_panel(
    State(state): State<QueryApiState>,
    path: PanelPath,
    ValidatedJson(req): ValidatedJson<PanelQueryRequest>,
) -> Result<Json<PanelQueryResponse>, ApiError> {
    let panel = find_panel(&path.panel).ok_or_else(|| {
        ApiError::not_found("PANEL_NOT_FOUND", format!("Unknown panel: {}", path.panel))
    })?;
    let dataset = state.dataset(panel.dataset)?;
    let filter = compile_for(dataset, req.filters)?;

    let slot = req.slot.map(|session| format!("{}:{}", session, panel.id));
    let rows = state
        .dispatcher
        .execute(slot.as_deref(), panel.render(dataset, &filter))
        .await
        .map_err(ApiError::from_dispatch)?;

    tracing::debug!(panel = panel.id, rows = rows.len(), "Panel query completed");

    Ok(Json(PanelQueryResponse {
        panel: panel.id.to_string(),
        rows: rows.as_ref().clone(),
    }))
}
