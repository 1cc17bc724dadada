use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use bson::{oid::ObjectId, DateTime};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{Role, Short, ShortComment, ShortCommentView, ShortView},
    repositories::{FeedQuery, ShortRepository, ShortRepositoryImpl},
    search::{parse_object_id, parse_page, PageRequest, ValidationErrors},
};

use super::{ApiError, ApiResponse, Paginated};

const MAX_COMMENT_LENGTH: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(feed).post(create_short))
        .route("/:id", get(get_short))
        .route("/:id/view", post(record_view))
        .route("/:id/like", post(like_short).delete(unlike_short))
        .route("/:id/bookmark", post(bookmark_short).delete(unbookmark_short))
        .route("/:id/comments", get(list_comments).post(create_comment))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedListQuery {
    tab: Option<String>,
    tag: Option<String>,
    salon_id: Option<String>,
    author_id: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

#[instrument(name = "shorts_feed", skip(app_state, query))]
async fn feed(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FeedListQuery>,
) -> Result<Json<ApiResponse<Paginated<ShortView>>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let salon_id = parse_object_id(&mut errors, "salonId", query.salon_id.as_deref());
    let author_id = parse_object_id(&mut errors, "authorId", query.author_id.as_deref());
    let page = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let mut feed_query = FeedQuery {
        tag: query.tag.filter(|tag| !tag.trim().is_empty()),
        salon_id,
        author_ids: author_id.map(|id| vec![id]),
    };

    // The following tab narrows the feed to authors the user follows. An
    // empty follow list short-circuits to an empty page.
    if feed_query.author_ids.is_none() && query.tab.as_deref() == Some("following") {
        let authors = repo.followed_authors(user.id).await?;
        if authors.is_empty() {
            return Ok(ApiResponse::ok(Paginated::new(Vec::new(), page, 0)));
        }
        feed_query.author_ids = Some(authors);
    }

    let (shorts, total) = repo.feed(&feed_query, &page).await?;
    let views = shorts.into_iter().map(ShortView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewShortBody {
    video_url: Option<String>,
    thumbnail_url: Option<String>,
    caption: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    salon_id: Option<String>,
}

#[instrument(name = "create_short", skip(app_state, body))]
async fn create_short(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewShortBody>,
) -> Result<Json<ApiResponse<ShortView>>, ApiError> {
    user.require_role(&[Role::Owner, Role::Provider])?;

    let mut errors = ValidationErrors::default();
    let video_url = match body.video_url.map(|url| url.trim().to_string()) {
        Some(url) if !url.is_empty() => Some(url),
        _ => {
            errors.push("videoUrl", "videoUrl is required");
            None
        }
    };
    let salon_id = parse_object_id(&mut errors, "salonId", body.salon_id.as_deref());
    errors.finish()?;
    let Some(video_url) = video_url else {
        return Err(ApiError::bad_request("videoUrl is required"));
    };

    let now = DateTime::now();
    let short = Short {
        id: ObjectId::new(),
        author_id: user.id,
        salon_id,
        video_url,
        thumbnail_url: body.thumbnail_url.filter(|url| !url.trim().is_empty()),
        caption: body.caption.unwrap_or_default(),
        tags: body
            .tags
            .into_iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect(),
        view_count: 0,
        like_count: 0,
        comment_count: 0,
        bookmark_count: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    repo.insert(&short).await?;
    Ok(ApiResponse::ok(ShortView::from(short)))
}

#[instrument(name = "get_short", skip(app_state))]
async fn get_short(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ShortView>>, ApiError> {
    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    Ok(ApiResponse::ok(ShortView::from(short)))
}

#[instrument(name = "record_short_view", skip(app_state))]
async fn record_view(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    repo.record_view(short.id).await?;
    Ok(ApiResponse::message("View recorded"))
}

#[instrument(name = "like_short", skip(app_state))]
async fn like_short(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    repo.like(short.id, user.id).await?;
    Ok(ApiResponse::message("Short liked"))
}

#[instrument(name = "unlike_short", skip(app_state))]
async fn unlike_short(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    let removed = repo.unlike(short.id, user.id).await?;
    if !removed {
        return Err(ApiError::not_found("Short is not liked"));
    }
    Ok(ApiResponse::message("Short unliked"))
}

#[instrument(name = "bookmark_short", skip(app_state))]
async fn bookmark_short(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    repo.bookmark(short.id, user.id).await?;
    Ok(ApiResponse::message("Short bookmarked"))
}

#[instrument(name = "unbookmark_short", skip(app_state))]
async fn unbookmark_short(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    let removed = repo.unbookmark(short.id, user.id).await?;
    if !removed {
        return Err(ApiError::not_found("Short is not bookmarked"));
    }
    Ok(ApiResponse::message("Short removed from bookmarks"))
}

#[derive(Debug, Default, Deserialize)]
struct CommentListQuery {
    page: Option<String>,
    limit: Option<String>,
}

#[instrument(name = "list_short_comments", skip(app_state, query))]
async fn list_comments(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<CommentListQuery>,
) -> Result<Json<ApiResponse<Paginated<ShortCommentView>>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let page: PageRequest = parse_page(
        &mut errors,
        query.page.as_deref(),
        query.limit.as_deref(),
        &app_state.search,
    );
    errors.finish()?;

    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    let (comments, total) = repo.list_comments(short.id, &page).await?;
    let views = comments.into_iter().map(ShortCommentView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[derive(Debug, Deserialize)]
struct NewCommentBody {
    text: Option<String>,
}

#[instrument(name = "create_short_comment", skip(app_state, body))]
async fn create_comment(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<NewCommentBody>,
) -> Result<Json<ApiResponse<ShortCommentView>>, ApiError> {
    let text = match body.text.map(|text| text.trim().to_string()) {
        Some(text) if !text.is_empty() && text.chars().count() <= MAX_COMMENT_LENGTH => text,
        Some(text) if text.chars().count() > MAX_COMMENT_LENGTH => {
            let mut errors = ValidationErrors::default();
            errors.push(
                "text",
                format!("text must be at most {MAX_COMMENT_LENGTH} characters"),
            );
            return Err(errors.into());
        }
        _ => {
            let mut errors = ValidationErrors::default();
            errors.push("text", "text is required");
            return Err(errors.into());
        }
    };

    let repo = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let short = find_short(&repo, &id).await?;
    let comment = ShortComment {
        id: ObjectId::new(),
        short_id: short.id,
        user_id: user.id,
        text,
        created_at: DateTime::now(),
    };
    repo.insert_comment(&comment).await?;
    Ok(ApiResponse::ok(ShortCommentView::from(comment)))
}

async fn find_short(repo: &ShortRepositoryImpl, id: &str) -> Result<Short, ApiError> {
    let short_id = ObjectId::parse_str(id).map_err(|_| ApiError::not_found("Short not found"))?;
    repo.find_by_id(short_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Short not found"))
}
