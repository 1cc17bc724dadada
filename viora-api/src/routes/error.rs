use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

use crate::domain::PromoError;
use crate::repositories::RepositoryError;
use crate::search::{FieldError, SortError, ValidationErrors};
use crate::services::BookingFlowError;

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<Vec<FieldError>>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// Duplicate writes surface as 400, mobile clients already treat any
    /// 4xx message generically and 409 never made it into the contract.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            errors: Some(errors.into_fields()),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::validation(errors)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::DatabaseError(ref e) => {
                tracing::error!("Database error: {:?}", e);
                Self::internal("Something went wrong")
            }
            RepositoryError::MalformedDocument(ref e) => {
                tracing::error!("Malformed document: {:?}", e);
                Self::internal("Something went wrong")
            }
            RepositoryError::NotFound(_) => Self::not_found(err.to_string()),
            RepositoryError::AlreadyExists(_) => Self::conflict(err.to_string()),
        }
    }
}

impl From<SortError> for ApiError {
    fn from(err: SortError) -> Self {
        let mut errors = ValidationErrors::default();
        errors.push("sortBy", err.to_string());
        Self::validation(errors)
    }
}

impl From<PromoError> for ApiError {
    fn from(err: PromoError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<BookingFlowError> for ApiError {
    fn from(err: BookingFlowError) -> Self {
        match err {
            BookingFlowError::BookingNotFound | BookingFlowError::SalonNotFound => {
                Self::not_found(err.to_string())
            }
            BookingFlowError::Validation(errors) => Self::validation(errors),
            BookingFlowError::Promo(promo) => promo.into(),
            BookingFlowError::InvalidTransition { .. } => Self::bad_request(err.to_string()),
            BookingFlowError::Forbidden => Self::forbidden(err.to_string()),
            BookingFlowError::Repository(repo) => repo.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_writes_map_to_400() {
        let error = ApiError::from(RepositoryError::AlreadyExists("favorite".to_string()));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_records_map_to_404() {
        let error = ApiError::from(RepositoryError::NotFound("salon x".to_string()));
        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_errors_keep_their_fields() {
        let mut errors = ValidationErrors::default();
        errors.push("minRating", "minRating must be a number");
        let error = ApiError::from(errors);
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.errors.unwrap()[0].field, "minRating");
    }
}
