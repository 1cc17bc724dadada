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
    domain::{Audience, ServiceMode, ServiceView},
    repositories::{
        ServiceRepository, ServiceRepositoryImpl, TaxonomyRepository, TaxonomyRepositoryImpl,
    },
    search::{
        check_range_order, parse_f64, parse_keyword_lenient, parse_object_id, parse_page,
        resolve_sort, PageRequest, SearchEntity, ServiceFilter, SortDirection, SortKey,
        ValidationErrors,
    },
};

use super::{ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_services))
        .route("/:id", get(get_service))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceListQuery {
    q: Option<String>,
    salon_id: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    service_type: Option<String>,
    mode: Option<String>,
    audience: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

struct ServiceListRequest {
    filter: ServiceFilter,
    category: Option<String>,
    service_type: Option<String>,
    sort_key: Option<SortKey>,
    sort_direction: Option<SortDirection>,
    page: PageRequest,
}

impl ServiceListQuery {
    fn into_request(self, app_state: &AppState) -> Result<ServiceListRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let mut filter = ServiceFilter {
            text: self.q.filter(|q| !q.trim().is_empty()),
            ..Default::default()
        };
        filter.salon_id = parse_object_id(&mut errors, "salonId", self.salon_id.as_deref());
        filter.mode = parse_keyword_lenient::<ServiceMode>(self.mode.as_deref());
        filter.audience = parse_keyword_lenient::<Audience>(self.audience.as_deref());
        filter.min_price = match parse_f64(&mut errors, "minPrice", self.min_price.as_deref()) {
            Some(price) if price < 0.0 => {
                errors.push("minPrice", "minPrice must not be negative");
                None
            }
            other => other,
        };
        filter.max_price = match parse_f64(&mut errors, "maxPrice", self.max_price.as_deref()) {
            Some(price) if price < 0.0 => {
                errors.push("maxPrice", "maxPrice must not be negative");
                None
            }
            other => other,
        };
        check_range_order(
            &mut errors,
            "minPrice",
            "maxPrice",
            filter.min_price,
            filter.max_price,
        );

        let sort_key = parse_keyword_lenient::<SortKey>(self.sort_by.as_deref());
        let sort_direction = parse_keyword_lenient::<SortDirection>(self.sort_order.as_deref());
        if matches!(sort_key, Some(SortKey::Distance)) {
            errors.push("sortBy", "distance sort requires lat and lng");
        }

        let page = parse_page(
            &mut errors,
            self.page.as_deref(),
            self.limit.as_deref(),
            &app_state.search,
        );

        errors.finish()?;
        Ok(ServiceListRequest {
            filter,
            category: self.category,
            service_type: self.service_type,
            sort_key,
            sort_direction,
            page,
        })
    }
}

#[instrument(name = "list_services", skip(app_state, query))]
async fn list_services(
    State(app_state): State<AppState>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<ApiResponse<Paginated<ServiceView>>>, ApiError> {
    let mut request = query.into_request(&app_state)?;

    if request.category.is_some() || request.service_type.is_some() {
        let taxonomy = TaxonomyRepositoryImpl::new(app_state.db.as_ref().clone());
        if let Some(reference) = &request.category {
            request.filter.category_id = Some(taxonomy.resolve_category(reference).await?.id);
        }
        if let Some(reference) = &request.service_type {
            request.filter.type_id = Some(taxonomy.resolve_type(reference).await?.id);
        }
    }

    let sort = resolve_sort(
        request.sort_key,
        request.sort_direction,
        SearchEntity::Service,
        false,
    )?;
    let repo = ServiceRepositoryImpl::new(app_state.db.as_ref().clone());
    let (services, total) = repo.list(&request.filter, &sort, &request.page).await?;

    let views = services.into_iter().map(ServiceView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, request.page, total)))
}

#[instrument(name = "get_service", skip(app_state))]
async fn get_service(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ServiceView>>, ApiError> {
    let service_id =
        ObjectId::parse_str(&id).map_err(|_| ApiError::not_found("Service not found"))?;
    let repo = ServiceRepositoryImpl::new(app_state.db.as_ref().clone());
    let service = repo
        .find_by_id(service_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Service not found"))?;
    Ok(ApiResponse::ok(ServiceView::from(service)))
}
