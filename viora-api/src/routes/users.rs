use axum::{
    extract::{Path, State},
    routing::{delete, get, patch, post},
    Json, Router,
};
use bson::{oid::ObjectId, DateTime};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{Address, AddressView, GeoPoint, UserView},
    repositories::{
        ProfilePatch, ShortRepository, ShortRepositoryImpl, UserRepository, UserRepositoryImpl,
    },
    search::{parse_f64_in, parse_object_id, ValidationErrors},
};

use super::{ApiError, ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/addresses", get(list_addresses).post(create_address))
        .route("/me/addresses/:id", delete(delete_address))
        .route("/me/addresses/:id/default", patch(set_default_address))
        .route("/:id/follow", post(follow_user).delete(unfollow_user))
}

#[instrument(name = "get_me", skip(app_state))]
async fn get_me(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let repo = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    let profile = repo
        .find_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok(UserView::from(profile)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateMeBody {
    name: Option<String>,
    phone: Option<String>,
    avatar_url: Option<String>,
}

#[instrument(name = "update_me", skip(app_state, body))]
async fn update_me(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateMeBody>,
) -> Result<Json<ApiResponse<UserView>>, ApiError> {
    let patch = ProfilePatch {
        name: body.name.filter(|name| !name.trim().is_empty()),
        phone: body.phone,
        avatar_url: body.avatar_url,
    };
    if patch.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let repo = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    let profile = repo
        .update_profile(user.id, &patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok(UserView::from(profile)))
}

#[instrument(name = "list_addresses", skip(app_state))]
async fn list_addresses(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<AddressView>>>, ApiError> {
    let repo = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    let addresses = repo.list_addresses(user.id).await?;
    let views = addresses.into_iter().map(AddressView::from).collect();
    Ok(ApiResponse::ok(views))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewAddressBody {
    label: Option<String>,
    line1: Option<String>,
    line2: Option<String>,
    area_id: Option<String>,
    city_id: Option<String>,
    lat: Option<String>,
    lng: Option<String>,
    #[serde(default)]
    is_default: bool,
}

impl NewAddressBody {
    fn into_address(self, user_id: ObjectId) -> Result<Address, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let label = match self.label.map(|label| label.trim().to_string()) {
            Some(label) if !label.is_empty() => Some(label),
            _ => {
                errors.push("label", "label is required");
                None
            }
        };
        let line1 = match self.line1.map(|line| line.trim().to_string()) {
            Some(line) if !line.is_empty() => Some(line),
            _ => {
                errors.push("line1", "line1 is required");
                None
            }
        };
        let area_id = parse_object_id(&mut errors, "areaId", self.area_id.as_deref());
        let city_id = parse_object_id(&mut errors, "cityId", self.city_id.as_deref());

        let location = match (self.lat.as_deref(), self.lng.as_deref()) {
            (None, None) => None,
            (Some(_), None) => {
                errors.push("lng", "lng is required when lat is given");
                None
            }
            (None, Some(_)) => {
                errors.push("lat", "lat is required when lng is given");
                None
            }
            (lat, lng) => {
                let lat = parse_f64_in(&mut errors, "lat", lat, -90.0, 90.0);
                let lng = parse_f64_in(&mut errors, "lng", lng, -180.0, 180.0);
                match (lat, lng) {
                    (Some(lat), Some(lng)) => Some(GeoPoint::new(lng, lat)),
                    _ => None,
                }
            }
        };

        errors.finish()?;
        let (Some(label), Some(line1)) = (label, line1) else {
            let mut errors = ValidationErrors::default();
            errors.push("label", "request could not be parsed");
            return Err(errors);
        };

        let now = DateTime::now();
        Ok(Address {
            id: ObjectId::new(),
            user_id,
            label,
            line1,
            line2: self.line2.filter(|line| !line.trim().is_empty()),
            area_id,
            city_id,
            location,
            is_default: self.is_default,
            created_at: now,
            updated_at: now,
        })
    }
}

#[instrument(name = "create_address", skip(app_state, body))]
async fn create_address(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewAddressBody>,
) -> Result<Json<ApiResponse<AddressView>>, ApiError> {
    let address = body.into_address(user.id)?;
    let repo = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    repo.insert_address(&address).await?;
    Ok(ApiResponse::ok(AddressView::from(address)))
}

#[instrument(name = "set_default_address", skip(app_state))]
async fn set_default_address(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let address_id = parse_address_id(&id)?;
    let repo = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    let updated = repo.set_default_address(user.id, address_id).await?;
    if !updated {
        return Err(ApiError::not_found("Address not found"));
    }
    Ok(ApiResponse::message("Default address updated"))
}

#[instrument(name = "delete_address", skip(app_state))]
async fn delete_address(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let address_id = parse_address_id(&id)?;
    let repo = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    let deleted = repo.delete_address(user.id, address_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Address not found"));
    }
    Ok(ApiResponse::message("Address deleted"))
}

#[instrument(name = "follow_user", skip(app_state))]
async fn follow_user(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let author_id = ObjectId::parse_str(&id).map_err(|_| ApiError::not_found("User not found"))?;
    if author_id == user.id {
        return Err(ApiError::bad_request("You cannot follow yourself"));
    }

    let users = UserRepositoryImpl::new(app_state.db.as_ref().clone());
    if users.find_by_id(author_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let shorts = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    shorts.follow(user.id, author_id).await?;
    Ok(ApiResponse::message("User followed"))
}

#[instrument(name = "unfollow_user", skip(app_state))]
async fn unfollow_user(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let author_id = ObjectId::parse_str(&id).map_err(|_| ApiError::not_found("User not found"))?;
    let shorts = ShortRepositoryImpl::new(app_state.db.as_ref().clone());
    let removed = shorts.unfollow(user.id, author_id).await?;
    if !removed {
        return Err(ApiError::not_found("User is not followed"));
    }
    Ok(ApiResponse::message("User unfollowed"))
}

fn parse_address_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::not_found("Address not found"))
}
