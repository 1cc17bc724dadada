use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{
        AreaView, Audience, CityView, ProviderView, SalonReview, SalonReviewView, SalonSubRatings,
        SalonView, ServiceMode, ServiceView,
    },
    repositories::{
        LocationRepository, LocationRepositoryImpl, ProviderRepository, ProviderRepositoryImpl,
        ReviewRepository, ReviewRepositoryImpl, SalonRepository, SalonRepositoryImpl,
        ServiceRepository, ServiceRepositoryImpl, TaxonomyRepository, TaxonomyRepositoryImpl,
    },
    search::{
        check_range_order, parse_bool, parse_f64_in, parse_geo, parse_i32, parse_keyword_lenient,
        parse_object_id, parse_page, resolve_sort, GeoQuery, PageRequest, SalonFilter,
        SearchEntity, SortDirection, SortKey, ValidationErrors,
    },
};

use super::{ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_salons))
        .route("/nearby", get(nearby_salons))
        .route("/:id", get(get_salon))
        .route("/:id/reviews", get(list_salon_reviews).post(create_salon_review))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalonListQuery {
    q: Option<String>,
    city_id: Option<String>,
    area_id: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    service_type: Option<String>,
    mode: Option<String>,
    audience: Option<String>,
    min_rating: Option<String>,
    max_rating: Option<String>,
    price_level: Option<String>,
    verified: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
    radius: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

struct SalonListRequest {
    filter: SalonFilter,
    category: Option<String>,
    service_type: Option<String>,
    geo: Option<GeoQuery>,
    sort_key: Option<SortKey>,
    sort_direction: Option<SortDirection>,
    page: PageRequest,
}

impl SalonListQuery {
    fn into_request(
        self,
        app_state: &AppState,
        require_geo: bool,
    ) -> Result<SalonListRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let mut filter = SalonFilter {
            text: self.q.filter(|q| !q.trim().is_empty()),
            ..Default::default()
        };
        filter.city_id = parse_object_id(&mut errors, "cityId", self.city_id.as_deref());
        filter.area_id = parse_object_id(&mut errors, "areaId", self.area_id.as_deref());
        filter.mode = parse_keyword_lenient::<ServiceMode>(self.mode.as_deref());
        filter.audience = parse_keyword_lenient::<Audience>(self.audience.as_deref());
        filter.min_rating =
            parse_f64_in(&mut errors, "minRating", self.min_rating.as_deref(), 0.0, 5.0);
        filter.max_rating =
            parse_f64_in(&mut errors, "maxRating", self.max_rating.as_deref(), 0.0, 5.0);
        check_range_order(
            &mut errors,
            "minRating",
            "maxRating",
            filter.min_rating,
            filter.max_rating,
        );
        filter.price_level = match parse_i32(&mut errors, "priceLevel", self.price_level.as_deref())
        {
            Some(level) if (1..=4).contains(&level) => Some(level),
            Some(_) => {
                errors.push("priceLevel", "priceLevel must be between 1 and 4");
                None
            }
            None => None,
        };
        filter.verified = parse_bool(&mut errors, "verified", self.verified.as_deref());

        let geo = parse_geo(
            &mut errors,
            self.lat.as_deref(),
            self.lng.as_deref(),
            self.radius.as_deref(),
            &app_state.search,
        );
        if require_geo && geo.is_none() && errors.is_empty() {
            errors.push("lat", "lat and lng are required");
        }

        let sort_key = parse_keyword_lenient::<SortKey>(self.sort_by.as_deref());
        let sort_direction = parse_keyword_lenient::<SortDirection>(self.sort_order.as_deref());
        if matches!(sort_key, Some(SortKey::Distance)) && geo.is_none() {
            errors.push("sortBy", "distance sort requires lat and lng");
        }

        let page = parse_page(
            &mut errors,
            self.page.as_deref(),
            self.limit.as_deref(),
            &app_state.search,
        );

        errors.finish()?;
        Ok(SalonListRequest {
            filter,
            category: self.category,
            service_type: self.service_type,
            geo,
            sort_key,
            sort_direction,
            page,
        })
    }
}

/// Category and type parameters accept either an id or a slug, so turning
/// them into filter ids needs the taxonomy collections.
async fn resolve_taxonomy(
    app_state: &AppState,
    request: &mut SalonListRequest,
) -> Result<(), ApiError> {
    if request.category.is_none() && request.service_type.is_none() {
        return Ok(());
    }
    let taxonomy = TaxonomyRepositoryImpl::new(app_state.db.as_ref().clone());
    if let Some(reference) = &request.category {
        request.filter.category_id = Some(taxonomy.resolve_category(reference).await?.id);
    }
    if let Some(reference) = &request.service_type {
        request.filter.type_id = Some(taxonomy.resolve_type(reference).await?.id);
    }
    Ok(())
}

#[instrument(name = "list_salons", skip(app_state, query))]
async fn list_salons(
    State(app_state): State<AppState>,
    Query(query): Query<SalonListQuery>,
) -> Result<Json<ApiResponse<Paginated<SalonView>>>, ApiError> {
    let mut request = query.into_request(&app_state, false)?;
    resolve_taxonomy(&app_state, &mut request).await?;

    let sort = resolve_sort(
        request.sort_key,
        request.sort_direction,
        SearchEntity::Salon,
        false,
    )?;
    let repo = SalonRepositoryImpl::new(app_state.db.as_ref().clone());
    let (salons, total) = repo.list(&request.filter, &sort, &request.page).await?;

    let views = salons.into_iter().map(SalonView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, request.page, total)))
}

#[instrument(name = "nearby_salons", skip(app_state, query))]
async fn nearby_salons(
    State(app_state): State<AppState>,
    Query(query): Query<SalonListQuery>,
) -> Result<Json<ApiResponse<Paginated<SalonView>>>, ApiError> {
    let mut request = query.into_request(&app_state, true)?;
    resolve_taxonomy(&app_state, &mut request).await?;

    let geo = request
        .geo
        .ok_or_else(|| ApiError::bad_request("lat and lng are required"))?;
    let sort = resolve_sort(
        request.sort_key,
        request.sort_direction,
        SearchEntity::Salon,
        true,
    )?;
    let repo = SalonRepositoryImpl::new(app_state.db.as_ref().clone());
    let (hits, total) = repo
        .search_nearby(&geo, &request.filter, &sort, &request.page)
        .await?;

    let views = hits.into_iter().map(SalonView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, request.page, total)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalonDetail {
    #[serde(flatten)]
    salon: SalonView,
    area: Option<AreaView>,
    city: Option<CityView>,
    services: Vec<ServiceView>,
    providers: Vec<ProviderView>,
}

#[instrument(name = "get_salon", skip(app_state))]
async fn get_salon(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SalonDetail>>, ApiError> {
    let salon_id = parse_salon_id(&id)?;
    let db = app_state.db.as_ref().clone();
    let salons = SalonRepositoryImpl::new(db.clone());
    let salon = salons
        .find_by_id(salon_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;

    let services_repo = ServiceRepositoryImpl::new(db.clone());
    let providers_repo = ProviderRepositoryImpl::new(db.clone());
    let (services, providers) = tokio::try_join!(
        services_repo.list_for_salon(salon_id),
        providers_repo.list_for_salon(salon_id),
    )?;

    let locations = LocationRepositoryImpl::new(db);
    let area = match salon.area_id {
        Some(area_id) => locations.find_area(area_id).await?.map(AreaView::from),
        None => None,
    };
    let city = match salon.city_id {
        Some(city_id) => locations.find_city(city_id).await?.map(CityView::from),
        None => None,
    };

    Ok(ApiResponse::ok(SalonDetail {
        salon: SalonView::from(salon),
        area,
        city,
        services: services.into_iter().map(ServiceView::from).collect(),
        providers: providers.into_iter().map(ProviderView::from).collect(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ReviewListQuery {
    page: Option<String>,
    limit: Option<String>,
}

#[instrument(name = "list_salon_reviews", skip(app_state, query))]
async fn list_salon_reviews(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ApiResponse<Paginated<SalonReviewView>>>, ApiError> {
    let salon_id = parse_salon_id(&id)?;
    let mut errors = ValidationErrors::default();
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let db = app_state.db.as_ref().clone();
    let salons = SalonRepositoryImpl::new(db.clone());
    salons
        .find_by_id(salon_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;

    let reviews = ReviewRepositoryImpl::new(db);
    let (items, total) = reviews.list_salon_reviews(salon_id, &page).await?;
    let views = items.into_iter().map(SalonReviewView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewReviewBody {
    rating: Option<f64>,
    comment: Option<String>,
    sub_ratings: Option<SalonSubRatings>,
}

#[instrument(name = "create_salon_review", skip(app_state, body))]
async fn create_salon_review(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<NewReviewBody>,
) -> Result<Json<ApiResponse<SalonReviewView>>, ApiError> {
    let salon_id = parse_salon_id(&id)?;
    let rating = validate_rating(body.rating)?;

    let db = app_state.db.as_ref().clone();
    let salons = SalonRepositoryImpl::new(db.clone());
    salons
        .find_by_id(salon_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Salon not found"))?;

    let review = SalonReview::new(salon_id, user.id, rating, body.comment, body.sub_ratings);
    let reviews = ReviewRepositoryImpl::new(db);
    reviews.insert_salon_review(&review).await?;

    if let Err(err) = app_state.ratings().refresh_salon(salon_id).await {
        tracing::error!("failed to refresh salon rating: {:?}", err);
    }

    Ok(ApiResponse::ok(SalonReviewView::from(review)))
}

fn parse_salon_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::not_found("Salon not found"))
}

pub(super) fn validate_rating(rating: Option<f64>) -> Result<f64, ValidationErrors> {
    match rating {
        Some(value) if value.is_finite() && (1.0..=5.0).contains(&value) => Ok(value),
        _ => {
            let mut errors = ValidationErrors::default();
            errors.push("rating", "rating must be a number between 1 and 5");
            Err(errors)
        }
    }
}
