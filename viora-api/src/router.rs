use axum::{http::Method, routing::get, Router};
use mongodb::Database;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{
    app_state::AppState,
    config::Settings,
    middleware::{rate_limit, RateLimiter},
    routes,
};

pub fn create(db: Database, config: &Settings) -> Router<()> {
    let base_app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/salons", routes::salons::router())
        .nest("/services", routes::services::router())
        .nest("/search", routes::search::router())
        .nest("/categories", routes::taxonomy::router())
        .nest("/cities", routes::locations::router())
        .nest("/providers", routes::providers::router())
        .nest("/bookings", routes::bookings::router())
        .nest("/favorites", routes::favorites::router())
        .nest("/notifications", routes::notifications::router())
        .nest("/promos", routes::promos::router())
        .nest("/shorts", routes::shorts::router())
        .nest("/users", routes::users::router());

    let app_state = AppState::new(db, config);
    let limiter = RateLimiter::new(config.rate_limit);

    let app_url = config.application.app_url.clone();
    let allowed_suffix = config.application.allowed_origin_suffix.clone();
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            "content-type".parse().unwrap(),
            "x-user-id".parse().unwrap(),
            "x-user-role".parse().unwrap(),
        ])
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or_default();
            if origin_str == app_url {
                return true;
            }
            if let Some(ref suffix) = allowed_suffix {
                return origin_str.starts_with("https://") && origin_str.ends_with(suffix.as_str());
            }
            false
        }));

    base_app
        .with_state(app_state)
        .layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
