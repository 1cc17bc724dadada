use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use itertools::Itertools;
use mongodb::Database;
use thiserror::Error;

use crate::domain::{
    Booking, BookingItem, BookingStatus, BookingTotals, Notification, NotificationKind,
    PromoError, Role, Salon, ServiceMode,
};
use crate::repositories::{
    BookingRepository, BookingRepositoryImpl, PromoRepository, PromoRepositoryImpl,
    ProviderRepository, ProviderRepositoryImpl, RepositoryError, SalonRepository,
    SalonRepositoryImpl, ServiceRepository, ServiceRepositoryImpl, UserRepository,
    UserRepositoryImpl,
};
use crate::search::ValidationErrors;
use crate::services::{Notifier, RatingService};

#[derive(Debug, Error)]
pub enum BookingFlowError {
    #[error("Booking not found")]
    BookingNotFound,
    #[error("Salon not found")]
    SalonNotFound,
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Promo(#[from] PromoError),
    #[error("Cannot change booking from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    #[error("Not allowed to modify this booking")]
    Forbidden,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a client submits to book. Ids are already parsed, business checks
/// happen in [`BookingFlow::create`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub salon_id: ObjectId,
    pub provider_id: Option<ObjectId>,
    pub service_ids: Vec<ObjectId>,
    pub scheduled_at: DateTime,
    pub mode: ServiceMode,
    pub address_id: Option<ObjectId>,
    pub promo_code: Option<String>,
}

/// Booking lifecycle: creation with pricing, and the single entry point for
/// every status change. Routes never touch booking status directly.
pub struct BookingFlow {
    salons: SalonRepositoryImpl,
    services: ServiceRepositoryImpl,
    providers: ProviderRepositoryImpl,
    bookings: BookingRepositoryImpl,
    promos: PromoRepositoryImpl,
    users: UserRepositoryImpl,
    ratings: RatingService,
    notifier: Arc<Notifier>,
}

/// Shape checks that need no database access. Returns the deduplicated
/// service ids in submission order.
fn validate_request(request: &NewBooking) -> Result<Vec<ObjectId>, BookingFlowError> {
    let mut errors = ValidationErrors::default();

    let service_ids: Vec<ObjectId> = request.service_ids.iter().copied().unique().collect();
    if service_ids.is_empty() {
        errors.push("serviceIds", "at least one service is required");
    }
    if request.mode == ServiceMode::Both {
        errors.push("mode", "mode must be toSalon or toHome");
    }
    if request.mode == ServiceMode::ToHome && request.address_id.is_none() {
        errors.push("addressId", "addressId is required for home visits");
    }
    if request.scheduled_at <= DateTime::now() {
        errors.push("scheduledAt", "scheduledAt must be in the future");
    }

    errors
        .finish()
        .map_err(BookingFlowError::Validation)
        .map(|_| service_ids)
}

fn booking_number(id: ObjectId, created_at: DateTime) -> String {
    let date = created_at.to_chrono().format("%y%m%d");
    let hex = id.to_hex();
    let tail = &hex[hex.len() - 6..];
    format!("VB{}-{}", date, tail.to_uppercase())
}

fn status_notification(booking: &Booking, status: BookingStatus) -> (String, String) {
    let number = &booking.booking_number;
    match status {
        BookingStatus::Pending => (
            "Booking received".to_string(),
            format!("Your booking {number} is awaiting confirmation."),
        ),
        BookingStatus::Confirmed => (
            "Booking confirmed".to_string(),
            format!("Your booking {number} has been confirmed."),
        ),
        BookingStatus::InProgress => (
            "Service started".to_string(),
            format!("Your booking {number} is now in progress."),
        ),
        BookingStatus::Completed => (
            "Service completed".to_string(),
            format!("Your booking {number} is complete. Leave a review!"),
        ),
        BookingStatus::Cancelled => (
            "Booking cancelled".to_string(),
            format!("Your booking {number} has been cancelled."),
        ),
        BookingStatus::NoShow => (
            "Missed appointment".to_string(),
            format!("Your booking {number} was marked as a no-show."),
        ),
    }
}

impl BookingFlow {
    pub fn new(db: Database, notifier: Arc<Notifier>) -> Self {
        Self {
            salons: SalonRepositoryImpl::new(db.clone()),
            services: ServiceRepositoryImpl::new(db.clone()),
            providers: ProviderRepositoryImpl::new(db.clone()),
            bookings: BookingRepositoryImpl::new(db.clone()),
            promos: PromoRepositoryImpl::new(db.clone()),
            users: UserRepositoryImpl::new(db.clone()),
            ratings: RatingService::new(db),
            notifier,
        }
    }

    #[tracing::instrument(skip(self, request), fields(salon_id = %request.salon_id))]
    pub async fn create(
        &self,
        customer_id: ObjectId,
        request: NewBooking,
    ) -> Result<Booking, BookingFlowError> {
        let service_ids = validate_request(&request)?;

        let salon = self
            .salons
            .find_by_id(request.salon_id)
            .await?
            .filter(|salon| salon.is_active)
            .ok_or(BookingFlowError::SalonNotFound)?;
        self.check_salon_supports(&salon, request.mode)?;

        if let (ServiceMode::ToHome, Some(address_id)) = (request.mode, request.address_id) {
            // The address must be one of the customer's own.
            if self.users.find_address(customer_id, address_id).await?.is_none() {
                return Err(single_field_error("addressId", "address not found"));
            }
        }

        let services = self.services.find_active_by_ids(&service_ids).await?;
        if services.len() != service_ids.len() {
            return Err(single_field_error(
                "serviceIds",
                "one or more services are unavailable",
            ));
        }
        for service in &services {
            if service.salon_id != salon.id {
                return Err(single_field_error(
                    "serviceIds",
                    "all services must belong to the chosen salon",
                ));
            }
            if service.mode != ServiceMode::Both && service.mode != request.mode {
                return Err(single_field_error(
                    "mode",
                    format!("'{}' is not available {}", service.name, request.mode),
                ));
            }
        }

        let home_fee = match request.provider_id {
            Some(provider_id) => {
                let provider = self
                    .providers
                    .find_by_id(provider_id)
                    .await?
                    .filter(|provider| provider.is_active)
                    .ok_or_else(|| {
                        single_field_error("providerId", "provider not found")
                    })?;
                if provider.salon_id != Some(salon.id) {
                    return Err(single_field_error(
                        "providerId",
                        "provider does not work at this salon",
                    ));
                }
                if request.mode == ServiceMode::ToHome && !provider.serves_home_visits() {
                    return Err(single_field_error(
                        "providerId",
                        "provider does not offer home visits",
                    ));
                }
                if request.mode == ServiceMode::ToHome {
                    provider.home_fee()
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        let items: Vec<BookingItem> = services
            .iter()
            .map(|service| BookingItem {
                service_id: service.id,
                name: service.name.clone(),
                price: service.effective_price(request.mode),
            })
            .collect();
        let subtotal: f64 = items.iter().map(|item| item.price).sum();

        let discount = match &request.promo_code {
            Some(code) => self.apply_promo(code, subtotal).await?,
            None => 0.0,
        };

        let id = ObjectId::new();
        let now = DateTime::now();
        let booking = Booking {
            id,
            booking_number: booking_number(id, now),
            customer_id,
            salon_id: salon.id,
            provider_id: request.provider_id,
            items,
            scheduled_at: request.scheduled_at,
            mode: request.mode,
            address_id: request.address_id,
            totals: BookingTotals {
                subtotal,
                discount,
                home_fee,
                total: (subtotal - discount + home_fee).max(0.0),
            },
            promo_code: request.promo_code.map(|code| code.trim().to_uppercase()),
            status: BookingStatus::Pending,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };
        self.bookings.insert(&booking).await?;

        if let Err(error) = tokio::try_join!(
            self.salons.increment_bookings(booking.salon_id),
            self.services.increment_bookings(&service_ids),
        ) {
            tracing::error!(
                "Failed to bump booking counters for {}: {}",
                booking.booking_number,
                error
            );
        }
        if let Err(error) = self.ratings.refresh_salon(booking.salon_id).await {
            tracing::error!("Failed to refresh popularity for {}: {}", booking.salon_id, error);
        }

        self.notify(&booking, BookingStatus::Pending).await;
        Ok(booking)
    }

    /// The only way a booking changes status. Permission, the transition
    /// table and the guarded write all run here so every caller gets the same
    /// rules.
    #[tracing::instrument(skip(self, reason))]
    pub async fn transition(
        &self,
        user_id: ObjectId,
        role: Role,
        booking_id: ObjectId,
        to: BookingStatus,
        reason: Option<String>,
    ) -> Result<Booking, BookingFlowError> {
        let booking = self
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or(BookingFlowError::BookingNotFound)?;

        if role == Role::Customer {
            let owns = booking.customer_id == user_id;
            if !owns || to != BookingStatus::Cancelled {
                return Err(BookingFlowError::Forbidden);
            }
        }

        let from = booking.status;
        if !from.can_transition_to(to) {
            return Err(BookingFlowError::InvalidTransition { from, to });
        }

        let reason = reason.filter(|_| to == BookingStatus::Cancelled);
        let updated = self
            .bookings
            .transition(booking_id, from, to, reason.as_deref())
            .await?;
        let Some(updated) = updated else {
            // Lost a race: report against the state the booking is in now.
            let current = self
                .bookings
                .find_by_id(booking_id)
                .await?
                .ok_or(BookingFlowError::BookingNotFound)?;
            return Err(BookingFlowError::InvalidTransition {
                from: current.status,
                to,
            });
        };

        self.notify(&updated, to).await;
        Ok(updated)
    }

    fn check_salon_supports(
        &self,
        salon: &Salon,
        mode: ServiceMode,
    ) -> Result<(), BookingFlowError> {
        if salon.mode != ServiceMode::Both && salon.mode != mode {
            return Err(single_field_error(
                "mode",
                format!("salon does not offer {mode} bookings"),
            ));
        }
        Ok(())
    }

    async fn apply_promo(&self, code: &str, subtotal: f64) -> Result<f64, BookingFlowError> {
        let promo = self
            .promos
            .find_by_code(code)
            .await?
            .ok_or(PromoError::Inactive)?;
        let discount = promo.discount_for(subtotal, DateTime::now())?;
        if !self.promos.redeem(code).await? {
            return Err(PromoError::Exhausted.into());
        }
        Ok(discount)
    }

    async fn notify(&self, booking: &Booking, status: BookingStatus) {
        let (title, body) = status_notification(booking, status);
        let notification = Notification::new(
            booking.customer_id,
            NotificationKind::Booking,
            title,
            body,
        )
        .about_booking(booking.id);
        self.notifier.dispatch(notification).await;
    }
}

fn single_field_error(field: &'static str, message: impl Into<String>) -> BookingFlowError {
    let mut errors = ValidationErrors::default();
    errors.push(field, message);
    BookingFlowError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> NewBooking {
        NewBooking {
            salon_id: ObjectId::new(),
            provider_id: None,
            service_ids: vec![ObjectId::new()],
            scheduled_at: DateTime::from_millis(DateTime::now().timestamp_millis() + 3_600_000),
            mode: ServiceMode::ToSalon,
            address_id: None,
            promo_code: None,
        }
    }

    #[test]
    fn booking_number_embeds_date_and_id_tail() {
        let id = ObjectId::parse_str("65a1b2c3d4e5f6a7b8c9dead").unwrap();
        let at = DateTime::builder()
            .year(2026)
            .month(3)
            .day(14)
            .build()
            .unwrap();
        assert_eq!(booking_number(id, at), "VB260314-C9DEAD");
    }

    #[test]
    fn empty_services_are_rejected() {
        let mut request = request();
        request.service_ids.clear();
        let error = validate_request(&request).unwrap_err();
        let BookingFlowError::Validation(errors) = error else {
            panic!("expected validation error");
        };
        assert_eq!(errors.into_fields()[0].field, "serviceIds");
    }

    #[test]
    fn duplicate_services_collapse() {
        let mut request = request();
        let id = ObjectId::new();
        request.service_ids = vec![id, id, id];
        assert_eq!(validate_request(&request).unwrap(), vec![id]);
    }

    #[test]
    fn both_is_not_a_bookable_mode() {
        let mut request = request();
        request.mode = ServiceMode::Both;
        let BookingFlowError::Validation(errors) = validate_request(&request).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.into_fields()[0].field, "mode");
    }

    #[test]
    fn home_visit_requires_an_address() {
        let mut request = request();
        request.mode = ServiceMode::ToHome;
        let BookingFlowError::Validation(errors) = validate_request(&request).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.into_fields()[0].field, "addressId");
    }

    #[test]
    fn past_appointments_are_rejected() {
        let mut request = request();
        request.scheduled_at = DateTime::from_millis(DateTime::now().timestamp_millis() - 1_000);
        let BookingFlowError::Validation(errors) = validate_request(&request).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.into_fields()[0].field, "scheduledAt");
    }

    #[test]
    fn every_problem_is_reported_at_once() {
        let mut request = request();
        request.service_ids.clear();
        request.mode = ServiceMode::Both;
        request.scheduled_at = DateTime::from_millis(0);
        let BookingFlowError::Validation(errors) = validate_request(&request).unwrap_err() else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.into_fields().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["serviceIds", "mode", "scheduledAt"]);
    }
}
