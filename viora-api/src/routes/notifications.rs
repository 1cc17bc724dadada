use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::NotificationView,
    repositories::{NotificationRepository, NotificationRepositoryImpl},
    search::{parse_bool, parse_page, ValidationErrors},
};

use super::{ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/read-all", post(mark_all_read))
        .route("/:id/read", post(mark_read))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationListQuery {
    unread_only: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationList {
    #[serde(flatten)]
    page: Paginated<NotificationView>,
    unread_count: u64,
}

#[instrument(name = "list_notifications", skip(app_state, query))]
async fn list_notifications(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<NotificationListQuery>,
) -> Result<Json<ApiResponse<NotificationList>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let unread_only =
        parse_bool(&mut errors, "unreadOnly", query.unread_only.as_deref()).unwrap_or(false);
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let repo = NotificationRepositoryImpl::new(app_state.db.as_ref().clone());
    let ((notifications, total), unread_count) = tokio::try_join!(
        repo.list_for_user(user.id, unread_only, &page),
        repo.unread_count(user.id),
    )?;

    let views = notifications.into_iter().map(NotificationView::from).collect();
    Ok(ApiResponse::ok(NotificationList {
        page: Paginated::new(views, page, total),
        unread_count,
    }))
}

#[instrument(name = "mark_notification_read", skip(app_state))]
async fn mark_read(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let notification_id =
        ObjectId::parse_str(&id).map_err(|_| ApiError::not_found("Notification not found"))?;
    let repo = NotificationRepositoryImpl::new(app_state.db.as_ref().clone());
    let marked = repo.mark_read(notification_id, user.id).await?;
    if !marked {
        return Err(ApiError::not_found("Notification not found"));
    }
    Ok(ApiResponse::message("Notification marked as read"))
}

#[instrument(name = "mark_all_notifications_read", skip(app_state))]
async fn mark_all_read(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = NotificationRepositoryImpl::new(app_state.db.as_ref().clone());
    let marked = repo.mark_all_read(user.id).await?;
    Ok(ApiResponse::message(format!(
        "{marked} notifications marked as read"
    )))
}
