use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get},
    Json, Router,
};
use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{Favorite, SalonView},
    repositories::{
        FavoriteRepository, FavoriteRepositoryImpl, SalonRepository, SalonRepositoryImpl,
    },
    search::{parse_object_id, parse_page, ValidationErrors},
};

use super::{ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites).post(add_favorite))
        .route("/:salon_id", delete(remove_favorite))
}

#[derive(Debug, Default, Deserialize)]
struct FavoriteListQuery {
    page: Option<String>,
    limit: Option<String>,
}

#[instrument(name = "list_favorites", skip(app_state, query))]
async fn list_favorites(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FavoriteListQuery>,
) -> Result<Json<ApiResponse<Paginated<SalonView>>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let db = app_state.db.as_ref().clone();
    let favorites_repo = FavoriteRepositoryImpl::new(db.clone());
    let (favorites, total) = favorites_repo.list_for_user(user.id, &page).await?;

    let salon_ids: Vec<ObjectId> = favorites.iter().map(|f| f.salon_id).collect();
    let salons_repo = SalonRepositoryImpl::new(db);
    let salons = salons_repo.find_by_ids(&salon_ids).await?;

    // Keep the favorites ordering (most recently saved first), dropping
    // salons that have been deleted since.
    let mut by_id: HashMap<ObjectId, SalonView> = salons
        .into_iter()
        .map(|salon| (salon.id, SalonView::from(salon)))
        .collect();
    let views: Vec<SalonView> = salon_ids
        .iter()
        .filter_map(|id| by_id.remove(id))
        .collect();

    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewFavoriteBody {
    salon_id: Option<String>,
}

#[instrument(name = "add_favorite", skip(app_state, body))]
async fn add_favorite(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewFavoriteBody>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let salon_id = match body.salon_id.as_deref() {
        None => {
            errors.push("salonId", "salonId is required");
            None
        }
        raw => parse_object_id(&mut errors, "salonId", raw),
    };
    errors.finish()?;
    let Some(salon_id) = salon_id else {
        return Err(ApiError::bad_request("salonId is required"));
    };
    let db = app_state.db.as_ref().clone();

    let salons = SalonRepositoryImpl::new(db.clone());
    salons
        .find_by_id(salon_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;

    let favorites = FavoriteRepositoryImpl::new(db);
    favorites.insert(&Favorite::new(user.id, salon_id)).await?;
    if let Err(err) = salons.adjust_favorites(salon_id, 1).await {
        tracing::error!("failed to bump favorites count: {:?}", err);
    }

    Ok(ApiResponse::message("Salon added to favorites"))
}

#[instrument(name = "remove_favorite", skip(app_state))]
async fn remove_favorite(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let salon_id = parse_salon_id(&salon_id)?;
    let db = app_state.db.as_ref().clone();

    let favorites = FavoriteRepositoryImpl::new(db.clone());
    let removed = favorites.remove(user.id, salon_id).await?;
    if !removed {
        return Err(ApiError::not_found("Salon is not in favorites"));
    }

    let salons = SalonRepositoryImpl::new(db);
    if let Err(err) = salons.adjust_favorites(salon_id, -1).await {
        tracing::error!("failed to drop favorites count: {:?}", err);
    }

    Ok(ApiResponse::message("Salon removed from favorites"))
}

fn parse_salon_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::not_found("Salon not found"))
}
