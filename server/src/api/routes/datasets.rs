//! Dataset catalog and filter option endpoints

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, HeaderValue, header};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{QueryApiState, compile_for};
use crate::api::extractors::OptionPath;
use crate::api::types::ApiError;
use crate::data::datasets::Dataset;
use crate::data::filters::{CompiledFilter, parse_filters};
use crate::domain::option_query;

#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetsResponse {
    pub datasets: Vec<Dataset>,
}

/// List datasets with their filterable fields
#[utoipa::path(
    get,
    path = "/api/v1/datasets",
    tag = "datasets",
    responses(
        (status = 200, description = "Dataset catalog", body = DatasetsResponse)
    )
)]
pub async fn list_datasets(State(state): State<QueryApiState>) -> Json<DatasetsResponse> {
    Json(DatasetsResponse {
        datasets: state.catalog.iter().cloned().collect(),
    })
}

#[derive(Debug, Deserialize)]
pub struct FieldOptionsQuery {
    /// JSON filter array narrowing the options
    pub filters: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldOptionsResponse {
    pub dataset: String,
    pub field: String,
    #[schema(value_type = Vec<Object>)]
    pub values: Vec<serde_json::Value>,
}

/// Distinct values of a string field, for filter dropdowns
#[utoipa::path(
    get,
    path = "/api/v1/datasets/{dataset}/options/{field}",
    tag = "datasets",
    params(
        ("dataset" = String, Path, description = "Dataset id"),
        ("field" = String, Path, description = "String field of the dataset"),
        ("filters" = Option<String>, Query, description = "JSON filter array applied to the options")
    ),
    responses(
        (status = 200, description = "Distinct field values", body = FieldOptionsResponse),
        (status = 400, description = "Invalid filters"),
        (status = 404, description = "Unknown dataset or field")
    )
)]
pub async fn get_field_options(
    State(state): State<QueryApiState>,
    path: OptionPath,
    Query(query): Query<FieldOptionsQuery>,
) -> Result<(HeaderMap, Json<FieldOptionsResponse>), ApiError> {
    let dataset = state.dataset(&path.dataset)?;
    let field = dataset.option_field(&path.field).ok_or_else(|| {
        ApiError::not_found(
            "FIELD_NOT_FOUND",
            format!("Dataset {} has no option field {}", dataset.id, path.field),
        )
    })?;

    let filter = match query.filters.as_deref() {
        Some(json) => {
            let spec = parse_filters(json).map_err(ApiError::from_filter_parse)?;
            compile_for(dataset, spec)?
        }
        None => CompiledFilter::default(),
    };

    let rows = state
        .dispatcher
        .execute(None, option_query(dataset, field, &filter))
        .await
        .map_err(ApiError::from_dispatch)?;

    let values = rows
        .iter()
        .filter_map(|row| row.get("value"))
        .filter(|v| !v.is_null())
        .cloned()
        .collect();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, max-age=30"),
    );

    Ok((
        headers,
        Json(FieldOptionsResponse {
            dataset: dataset.id.clone(),
            field: field.name.clone(),
            values,
        }),
    ))
}
