use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::{ServiceCategoryView, ServiceTypeView},
    repositories::{TaxonomyRepository, TaxonomyRepositoryImpl},
};

use super::{ApiError, ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/:reference/types", get(list_types))
}

#[instrument(name = "list_categories", skip(app_state))]
async fn list_categories(
    State(app_state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ServiceCategoryView>>>, ApiError> {
    let repo = TaxonomyRepositoryImpl::new(app_state.db.as_ref().clone());
    let categories = repo.list_categories().await?;
    let views = categories.into_iter().map(ServiceCategoryView::from).collect();
    Ok(ApiResponse::ok(views))
}

#[instrument(name = "list_types", skip(app_state))]
async fn list_types(
    State(app_state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<Vec<ServiceTypeView>>>, ApiError> {
    let repo = TaxonomyRepositoryImpl::new(app_state.db.as_ref().clone());
    let category = repo.resolve_category(&reference).await?;
    let types = repo.list_types(Some(category.id)).await?;
    let views = types.into_iter().map(ServiceTypeView::from).collect();
    Ok(ApiResponse::ok(views))
}
