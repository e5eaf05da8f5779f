//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{datasets, filters, health, panels};
use crate::data::datasets::Dataset;
use crate::data::filters::{CompiledFilter, FieldSchema, FieldType, FilterValue, Operator, Predicate};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Insight API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Analytics query gateway"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "datasets", description = "Dataset catalog and filter options"),
        (name = "filters", description = "Filter compilation"),
        (name = "panels", description = "Dashboard panel queries")
    ),
    paths(
        health::health,
        datasets::list_datasets,
        datasets::get_field_options,
        filters::compile_filters,
        panels::list_panels,
        panels::query_panel,
    ),
    components(schemas(
        health::HealthResponse,
        datasets::DatasetsResponse,
        datasets::FieldOptionsResponse,
        filters::CompileRequest,
        panels::PanelDto,
        panels::PanelsResponse,
        panels::PanelQueryRequest,
        panels::PanelQueryResponse,
        Dataset,
        FieldSchema,
        FieldType,
        Operator,
        FilterValue,
        Predicate,
        CompiledFilter,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}
