use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{ProviderReview, ProviderReviewView, ProviderSubRatings, ProviderView},
    repositories::{
        ProviderQuery, ProviderRepository, ProviderRepositoryImpl, ReviewRepository,
        ReviewRepositoryImpl,
    },
    search::{parse_bool, parse_f64_in, parse_object_id, parse_page, SortSpec, ValidationErrors},
};

use super::{salons::validate_rating, ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_providers))
        .route("/:id", get(get_provider))
        .route(
            "/:id/reviews",
            get(list_provider_reviews).post(create_provider_review),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderListQuery {
    salon_id: Option<String>,
    specialization: Option<String>,
    home_service_only: Option<String>,
    min_rating: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[instrument(name = "list_providers", skip(app_state, query))]
async fn list_providers(
    State(app_state): State<AppState>,
    Query(query): Query<ProviderListQuery>,
) -> Result<Json<ApiResponse<Paginated<ProviderView>>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let provider_query = ProviderQuery {
        salon_id: parse_object_id(&mut errors, "salonId", query.salon_id.as_deref()),
        specialization: parse_object_id(
            &mut errors,
            "specialization",
            query.specialization.as_deref(),
        ),
        home_service_only: parse_bool(
            &mut errors,
            "homeServiceOnly",
            query.home_service_only.as_deref(),
        )
        .unwrap_or(false),
        min_rating: parse_f64_in(&mut errors, "minRating", query.min_rating.as_deref(), 0.0, 5.0),
    };
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let sort = SortSpec {
        field: "averageRating",
        direction: -1,
    };
    let repo = ProviderRepositoryImpl::new(app_state.db.as_ref().clone());
    let (providers, total) = repo.list(&provider_query, &sort, &page).await?;

    let views = providers.into_iter().map(ProviderView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[instrument(name = "get_provider", skip(app_state))]
async fn get_provider(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProviderView>>, ApiError> {
    let provider_id = parse_provider_id(&id)?;
    let repo = ProviderRepositoryImpl::new(app_state.db.as_ref().clone());
    let provider = repo
        .find_by_id(provider_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;
    Ok(ApiResponse::ok(ProviderView::from(provider)))
}

#[derive(Debug, Default, Deserialize)]
struct ReviewListQuery {
    page: Option<String>,
    limit: Option<String>,
}

#[instrument(name = "list_provider_reviews", skip(app_state, query))]
async fn list_provider_reviews(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ApiResponse<Paginated<ProviderReviewView>>>, ApiError> {
    let provider_id = parse_provider_id(&id)?;
    let mut errors = ValidationErrors::default();
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let db = app_state.db.as_ref().clone();
    let providers = ProviderRepositoryImpl::new(db.clone());
    providers
        .find_by_id(provider_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;

    let reviews = ReviewRepositoryImpl::new(db);
    let (items, total) = reviews.list_provider_reviews(provider_id, &page).await?;
    let views = items.into_iter().map(ProviderReviewView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewReviewBody {
    rating: Option<f64>,
    comment: Option<String>,
    sub_ratings: Option<ProviderSubRatings>,
}

#[instrument(name = "create_provider_review", skip(app_state, body))]
async fn create_provider_review(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<NewReviewBody>,
) -> Result<Json<ApiResponse<ProviderReviewView>>, ApiError> {
    let provider_id = parse_provider_id(&id)?;
    let rating = validate_rating(body.rating)?;

    let db = app_state.db.as_ref().clone();
    let providers = ProviderRepositoryImpl::new(db.clone());
    providers
        .find_by_id(provider_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;

    let review = ProviderReview::new(provider_id, user.id, rating, body.comment, body.sub_ratings);
    let reviews = ReviewRepositoryImpl::new(db);
    reviews.insert_provider_review(&review).await?;

    if let Err(err) = app_state.ratings().refresh_provider(provider_id).await {
        tracing::error!("failed to refresh provider rating: {:?}", err);
    }

    Ok(ApiResponse::ok(ProviderReviewView::from(review)))
}

fn parse_provider_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::not_found("Provider not found"))
}
