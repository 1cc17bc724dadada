use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::{Audience, SalonView, ServiceMode, ServiceView},
    repositories::{SalonRepository, SalonRepositoryImpl, ServiceRepository, ServiceRepositoryImpl},
    search::{
        parse_geo, parse_keyword_lenient, parse_page, resolve_sort, SalonFilter, SearchEntity,
        ServiceFilter, ValidationErrors,
    },
};

use super::{ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search_everything))
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
    mode: Option<String>,
    audience: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
    radius: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

/// One page of salons and one of services for the same needle.
#[derive(Debug, Serialize)]
struct SearchResults {
    salons: Paginated<SalonView>,
    services: Paginated<ServiceView>,
}

#[instrument(name = "search_everything", skip(app_state, query))]
async fn search_everything(
    State(app_state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchResults>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let text = query.q.filter(|q| !q.trim().is_empty());
    let mode = parse_keyword_lenient::<ServiceMode>(query.mode.as_deref());
    let audience = parse_keyword_lenient::<Audience>(query.audience.as_deref());
    let geo = parse_geo(
        &mut errors,
        query.lat.as_deref(),
        query.lng.as_deref(),
        query.radius.as_deref(),
        &app_state.search,
    );
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let salon_filter = SalonFilter {
        text: text.clone(),
        mode,
        audience,
        ..Default::default()
    };
    let service_filter = ServiceFilter {
        text,
        mode,
        audience,
        ..Default::default()
    };

    let salon_sort = resolve_sort(None, None, SearchEntity::Salon, geo.is_some())?;
    let service_sort = resolve_sort(None, None, SearchEntity::Service, false)?;

    let db = app_state.db.as_ref().clone();
    let salons_repo = SalonRepositoryImpl::new(db.clone());
    let services_repo = ServiceRepositoryImpl::new(db);

    let services_page = services_repo.list(&service_filter, &service_sort, &page);
    let (salons, services) = match geo {
        Some(geo) => {
            let ((hits, salon_total), (services, service_total)) = tokio::try_join!(
                salons_repo.search_nearby(&geo, &salon_filter, &salon_sort, &page),
                services_page,
            )?;
            let salon_views: Vec<SalonView> = hits.into_iter().map(SalonView::from).collect();
            let service_views: Vec<ServiceView> =
                services.into_iter().map(ServiceView::from).collect();
            (
                Paginated::new(salon_views, page, salon_total),
                Paginated::new(service_views, page, service_total),
            )
        }
        None => {
            let ((salons, salon_total), (services, service_total)) = tokio::try_join!(
                salons_repo.list(&salon_filter, &salon_sort, &page),
                services_page,
            )?;
            let salon_views: Vec<SalonView> = salons.into_iter().map(SalonView::from).collect();
            let service_views: Vec<ServiceView> =
                services.into_iter().map(ServiceView::from).collect();
            (
                Paginated::new(salon_views, page, salon_total),
                Paginated::new(service_views, page, service_total),
            )
        }
    };

    Ok(ApiResponse::ok(SearchResults { salons, services }))
}
