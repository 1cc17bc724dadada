use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DiscountKind {
    Percent,
    Fixed,
}

#[derive(Debug, Error, PartialEq)]
pub enum PromoError {
    #[error("Promo code is not active")]
    Inactive,
    #[error("Promo code is not valid at this time")]
    OutsideWindow,
    #[error("Promo code has reached its usage limit")]
    Exhausted,
    #[error("Order must be at least {min} to use this code")]
    BelowMinimum { min: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoCode {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub code: String,
    pub kind: DiscountKind,
    pub value: f64,
    #[serde(default)]
    pub min_order_value: f64,
    pub valid_from: DateTime,
    pub valid_until: DateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub used_count: i64,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl PromoCode {
    /// Discount this code grants on `order_value`, never more than the order
    /// itself. All eligibility checks happen here so the validation endpoint
    /// and the booking flow agree.
    pub fn discount_for(&self, order_value: f64, now: DateTime) -> Result<f64, PromoError> {
        if !self.is_active {
            return Err(PromoError::Inactive);
        }
        if now < self.valid_from || now > self.valid_until {
            return Err(PromoError::OutsideWindow);
        }
        if let Some(max_uses) = self.max_uses {
            if self.used_count >= max_uses {
                return Err(PromoError::Exhausted);
            }
        }
        if order_value < self.min_order_value {
            return Err(PromoError::BelowMinimum {
                min: self.min_order_value,
            });
        }

        let discount = match self.kind {
            DiscountKind::Percent => order_value * self.value / 100.0,
            DiscountKind::Fixed => self.value,
        };
        Ok(discount.min(order_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promo(kind: DiscountKind, value: f64) -> PromoCode {
        let now = DateTime::now();
        PromoCode {
            id: ObjectId::new(),
            code: "GLOW20".to_string(),
            kind,
            value,
            min_order_value: 50.0,
            valid_from: DateTime::from_millis(now.timestamp_millis() - 86_400_000),
            valid_until: DateTime::from_millis(now.timestamp_millis() + 86_400_000),
            max_uses: Some(100),
            used_count: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn percent_discount_scales_with_order() {
        let promo = promo(DiscountKind::Percent, 20.0);
        assert_eq!(promo.discount_for(200.0, DateTime::now()).unwrap(), 40.0);
    }

    #[test]
    fn fixed_discount_never_exceeds_order() {
        let promo = promo(DiscountKind::Fixed, 75.0);
        assert_eq!(promo.discount_for(60.0, DateTime::now()).unwrap(), 60.0);
    }

    #[test]
    fn below_minimum_order_is_rejected() {
        let promo = promo(DiscountKind::Percent, 20.0);
        assert_eq!(
            promo.discount_for(30.0, DateTime::now()),
            Err(PromoError::BelowMinimum { min: 50.0 })
        );
    }

    #[test]
    fn exhausted_code_is_rejected() {
        let mut promo = promo(DiscountKind::Percent, 20.0);
        promo.used_count = 100;
        assert_eq!(
            promo.discount_for(200.0, DateTime::now()),
            Err(PromoError::Exhausted)
        );
    }

    #[test]
    fn expired_code_is_rejected() {
        let mut promo = promo(DiscountKind::Percent, 20.0);
        promo.valid_until = DateTime::from_millis(promo.valid_from.timestamp_millis() + 1);
        assert_eq!(
            promo.discount_for(200.0, DateTime::now()),
            Err(PromoError::OutsideWindow)
        );
    }
}
