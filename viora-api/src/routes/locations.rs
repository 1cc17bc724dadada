use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::{AreaView, CityView},
    repositories::{LocationRepository, LocationRepositoryImpl},
};

use super::{ApiError, ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cities))
        .route("/:reference/areas", get(list_areas))
}

#[instrument(name = "list_cities", skip(app_state))]
async fn list_cities(
    State(app_state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<CityView>>>, ApiError> {
    let repo = LocationRepositoryImpl::new(app_state.db.as_ref().clone());
    let cities = repo.list_cities().await?;
    let views = cities.into_iter().map(CityView::from).collect();
    Ok(ApiResponse::ok(views))
}

#[instrument(name = "list_areas", skip(app_state))]
async fn list_areas(
    State(app_state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ApiResponse<Vec<AreaView>>>, ApiError> {
    let repo = LocationRepositoryImpl::new(app_state.db.as_ref().clone());
    let city = repo.resolve_city(&reference).await?;
    let areas = repo.list_areas(city.id).await?;
    let views = areas.into_iter().map(AreaView::from).collect();
    Ok(ApiResponse::ok(views))
}
