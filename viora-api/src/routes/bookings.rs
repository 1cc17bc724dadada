use axum::{
    extract::{Path, Query, State},
    routing::{get, patch, post},
    Json, Router,
};
use bson::oid::ObjectId;
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    domain::{BookingStatus, BookingView, Role, ServiceMode},
    repositories::{BookingRepository, BookingRepositoryImpl},
    search::{parse_keyword, parse_object_id, parse_page, PageRequest, ValidationErrors},
    services::NewBooking,
};

use super::{ApiError, ApiResponse, Paginated};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_my_bookings))
        .route("/salon/:salon_id", get(list_salon_bookings))
        .route("/:id", get(get_booking))
        .route("/:id/cancel", post(cancel_booking))
        .route("/:id/status", patch(update_booking_status))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewBookingBody {
    salon_id: Option<String>,
    provider_id: Option<String>,
    #[serde(default)]
    service_ids: Vec<String>,
    scheduled_at: Option<String>,
    mode: Option<String>,
    address_id: Option<String>,
    promo_code: Option<String>,
}

impl NewBookingBody {
    /// Shape-level checks only. Business rules (membership, mode support,
    /// promo windows) live in the booking flow.
    fn into_request(self) -> Result<NewBooking, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let salon_id = match self.salon_id.as_deref() {
            None => {
                errors.push("salonId", "salonId is required");
                None
            }
            raw => parse_object_id(&mut errors, "salonId", raw),
        };
        let provider_id = parse_object_id(&mut errors, "providerId", self.provider_id.as_deref());
        let address_id = parse_object_id(&mut errors, "addressId", self.address_id.as_deref());

        let mut service_ids = Vec::with_capacity(self.service_ids.len());
        for raw in &self.service_ids {
            match ObjectId::parse_str(raw.trim()) {
                Ok(id) => service_ids.push(id),
                Err(_) => {
                    errors.push("serviceIds", format!("'{raw}' is not a valid service id"));
                }
            }
        }

        let scheduled_at = match self.scheduled_at.as_deref() {
            None => {
                errors.push("scheduledAt", "scheduledAt is required");
                None
            }
            Some(raw) => match chrono::DateTime::parse_from_rfc3339(raw.trim()) {
                Ok(parsed) => Some(bson::DateTime::from_chrono(parsed)),
                Err(_) => {
                    errors.push("scheduledAt", "scheduledAt must be an ISO 8601 timestamp");
                    None
                }
            },
        };

        let mode = match self.mode.as_deref() {
            None => {
                errors.push("mode", "mode is required");
                None
            }
            raw => parse_keyword::<ServiceMode>(&mut errors, "mode", raw, "toSalon, toHome"),
        };

        errors.finish()?;

        // finish() returned Ok, so every required field parsed.
        let (Some(salon_id), Some(scheduled_at), Some(mode)) = (salon_id, scheduled_at, mode)
        else {
            let mut errors = ValidationErrors::default();
            errors.push("salonId", "request could not be parsed");
            return Err(errors);
        };
        Ok(NewBooking {
            salon_id,
            provider_id,
            service_ids,
            scheduled_at,
            mode,
            address_id,
            promo_code: self.promo_code,
        })
    }
}

#[instrument(name = "create_booking", skip(app_state, body))]
async fn create_booking(
    State(app_state): State<AppState>,
    user: AuthUser,
    Json(body): Json<NewBookingBody>,
) -> Result<Json<ApiResponse<BookingView>>, ApiError> {
    let request = body.into_request()?;
    let booking = app_state.booking_flow().create(user.id, request).await?;
    Ok(ApiResponse::ok(BookingView::from(booking)))
}

#[derive(Debug, Default, Deserialize)]
struct BookingListQuery {
    status: Option<String>,
    page: Option<String>,
    limit: Option<String>,
}

impl BookingListQuery {
    fn parse(
        self,
        app_state: &AppState,
    ) -> Result<(Option<BookingStatus>, PageRequest), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let status = parse_keyword::<BookingStatus>(
            &mut errors,
            "status",
            self.status.as_deref(),
            "pending, confirmed, in_progress, completed, cancelled, no_show",
        );
        let page = parse_page(
            &mut errors,
            self.page.as_deref(),
            self.limit.as_deref(),
            &app_state.search,
        );
        errors.finish()?;
        Ok((status, page))
    }
}

#[instrument(name = "list_my_bookings", skip(app_state, query))]
async fn list_my_bookings(
    State(app_state): State<AppState>,
    user: AuthUser,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Paginated<BookingView>>>, ApiError> {
    let (status, page) = query.parse(&app_state)?;
    let repo = BookingRepositoryImpl::new(app_state.db.as_ref().clone());
    let (bookings, total) = repo.list_for_customer(user.id, status, &page).await?;
    let views = bookings.into_iter().map(BookingView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[instrument(name = "list_salon_bookings", skip(app_state, query))]
async fn list_salon_bookings(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(salon_id): Path<String>,
    Query(query): Query<BookingListQuery>,
) -> Result<Json<ApiResponse<Paginated<BookingView>>>, ApiError> {
    user.require_role(&[Role::Owner, Role::Provider])?;
    let salon_id = ObjectId::parse_str(&salon_id)
        .map_err(|_| ApiError::not_found("Salon not found"))?;
    let (status, page) = query.parse(&app_state)?;

    let repo = BookingRepositoryImpl::new(app_state.db.as_ref().clone());
    let (bookings, total) = repo.list_for_salon(salon_id, status, &page).await?;
    let views = bookings.into_iter().map(BookingView::from).collect();
    Ok(ApiResponse::ok(Paginated::new(views, page, total)))
}

#[instrument(name = "get_booking", skip(app_state))]
async fn get_booking(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingView>>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let repo = BookingRepositoryImpl::new(app_state.db.as_ref().clone());
    let booking = repo
        .find_by_id(booking_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    if user.role == Role::Customer && booking.customer_id != user.id {
        return Err(ApiError::forbidden("You do not have access to this booking"));
    }
    Ok(ApiResponse::ok(BookingView::from(booking)))
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    reason: Option<String>,
}

#[instrument(name = "cancel_booking", skip(app_state, body))]
async fn cancel_booking(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<ApiResponse<BookingView>>, ApiError> {
    let booking_id = parse_booking_id(&id)?;
    let reason = body.and_then(|Json(body)| body.reason);
    let booking = app_state
        .booking_flow()
        .transition(user.id, user.role, booking_id, BookingStatus::Cancelled, reason)
        .await?;
    Ok(ApiResponse::ok(BookingView::from(booking)))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: Option<String>,
    reason: Option<String>,
}

#[instrument(name = "update_booking_status", skip(app_state, body))]
async fn update_booking_status(
    State(app_state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Json<ApiResponse<BookingView>>, ApiError> {
    let booking_id = parse_booking_id(&id)?;

    let mut errors = ValidationErrors::default();
    let status = match body.status.as_deref() {
        None => {
            errors.push("status", "status is required");
            None
        }
        raw => parse_keyword::<BookingStatus>(
            &mut errors,
            "status",
            raw,
            "pending, confirmed, in_progress, completed, cancelled, no_show",
        ),
    };
    errors.finish()?;
    let status = status.ok_or_else(|| ApiError::bad_request("status is required"))?;

    let booking = app_state
        .booking_flow()
        .transition(user.id, user.role, booking_id, status, body.reason)
        .await?;
    Ok(ApiResponse::ok(BookingView::from(booking)))
}

fn parse_booking_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::not_found("Booking not found"))
}
