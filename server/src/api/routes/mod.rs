//! API route handlers

pub mod datasets;
pub mod filters;
pub mod health;
pub mod panels;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::Utc;
use validator::ValidationError;

use crate::api::types::ApiError;
use crate::data::datasets::{Catalog, Dataset};
use crate::data::filters::{CompiledFilter, FilterSpec, MAX_FILTERS, compile};
use crate::domain::{QueryDispatcher, resolve_presets};

/// Shared state for the query API
#[derive(Clone)]
pub struct QueryApiState {
    pub catalog: Arc<Catalog>,
    pub dispatcher: Arc<QueryDispatcher>,
}

/// Build query API routes (mounted under `/api/v1`)
pub fn routes(catalog: Arc<Catalog>, dispatcher: Arc<QueryDispatcher>) -> Router<()> {
    let state = QueryApiState {
        catalog,
        dispatcher,
    };

    Router::new()
        .route("/health", get(health::health))
        .route("/datasets", get(datasets::list_datasets))
        .route(
            "/datasets/{dataset}/options/{field}",
            get(datasets::get_field_options),
        )
        .route("/filters/compile", post(filters::compile_filters))
        .route("/panels", get(panels::list_panels))
        .route("/panels/{panel}/query", post(panels::query_panel))
        .with_state(state)
}

impl QueryApiState {
    fn dataset(&self, id: &str) -> Result<&Dataset, ApiError> {
        self.catalog.get(id).ok_or_else(|| {
            ApiError::not_found("DATASET_NOT_FOUND", format!("Unknown dataset: {}", id))
        })
    }
}

/// Resolve date presets against today and compile against the dataset schema
fn compile_for(dataset: &Dataset, spec: FilterSpec) -> Result<CompiledFilter, ApiError> {
    let spec = resolve_presets(spec, Utc::now().date_naive());
    let compiled = compile(&spec, dataset.schema()).map_err(ApiError::from_compile)?;
    tracing::debug!(
        dataset = %dataset.id,
        clause = %compiled.clause,
        params = compiled.params.len(),
        "Compiled filters"
    );
    Ok(compiled)
}

/// Validator for request bodies carrying a filter spec
fn validate_filter_count(spec: &FilterSpec) -> Result<(), ValidationError> {
    if spec.len() > MAX_FILTERS {
        return Err(ValidationError::new("filters_too_many")
            .with_message(format!("Maximum {} filters allowed", MAX_FILTERS).into()));
    }
    Ok(())
}
