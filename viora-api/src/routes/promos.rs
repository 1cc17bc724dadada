use axum::{extract::State, routing::post, Json, Router};
use bson::DateTime;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_state::AppState,
    auth::AuthUser,
    repositories::{PromoRepository, PromoRepositoryImpl},
    search::ValidationErrors,
};

use super::{ApiError, ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new().route("/validate", post(validate_promo))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatePromoBody {
    code: Option<String>,
    order_value: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromoQuote {
    code: String,
    discount: f64,
    final_amount: f64,
}

/// Prices a promo code against an order without consuming a redemption.
/// The code is only counted as used when a booking is actually created.
#[instrument(name = "validate_promo", skip(app_state, body))]
async fn validate_promo(
    State(app_state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<ValidatePromoBody>,
) -> Result<Json<ApiResponse<PromoQuote>>, ApiError> {
    let mut errors = ValidationErrors::default();
    let code = match body.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Some(code.to_string()),
        _ => {
            errors.push("code", "code is required");
            None
        }
    };
    let order_value = match body.order_value {
        Some(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => {
            errors.push("orderValue", "orderValue must be a non-negative number");
            None
        }
    };
    errors.finish()?;
    let (Some(code), Some(order_value)) = (code, order_value) else {
        return Err(ApiError::bad_request("code and orderValue are required"));
    };

    let repo = PromoRepositoryImpl::new(app_state.db.as_ref().clone());
    let promo = repo
        .find_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::not_found("Promo code not found"))?;

    let discount = promo.discount_for(order_value, DateTime::now())?;
    Ok(ApiResponse::ok(PromoQuote {
        code: promo.code,
        discount,
        final_amount: (order_value - discount).max(0.0),
    }))
}
