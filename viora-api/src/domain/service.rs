use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{Audience, ServiceMode};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategory {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceType {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub category_id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub salon_id: ObjectId,
    pub service_type_id: ObjectId,
    /// Denormalized from the type so category filters skip a join.
    pub category_id: ObjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_price: Option<f64>,
    pub duration_minutes: i32,
    pub mode: ServiceMode,
    #[serde(default)]
    pub audience: Vec<Audience>,
    #[serde(default)]
    pub bookings_count: i64,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Service {
    /// Price a booking line actually pays: home visits use the home price when
    /// one is set, otherwise the discounted price wins over the list price.
    pub fn effective_price(&self, mode: ServiceMode) -> f64 {
        if mode == ServiceMode::ToHome {
            if let Some(home_price) = self.home_price {
                return home_price;
            }
        }
        self.discount_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategoryView {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    pub position: i32,
}

impl From<ServiceCategory> for ServiceCategoryView {
    fn from(category: ServiceCategory) -> Self {
        Self {
            id: category.id.to_hex(),
            name: category.name,
            slug: category.slug,
            icon_url: category.icon_url,
            position: category.position,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeView {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub slug: String,
}

impl From<ServiceType> for ServiceTypeView {
    fn from(service_type: ServiceType) -> Self {
        Self {
            id: service_type.id.to_hex(),
            category_id: service_type.category_id.to_hex(),
            name: service_type.name,
            slug: service_type.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    pub id: String,
    pub salon_id: String,
    pub service_type_id: String,
    pub category_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_price: Option<f64>,
    pub duration_minutes: i32,
    pub mode: ServiceMode,
    pub audience: Vec<Audience>,
    pub bookings_count: i64,
    pub bookings_count_display: String,
}

impl From<Service> for ServiceView {
    fn from(service: Service) -> Self {
        Self {
            id: service.id.to_hex(),
            salon_id: service.salon_id.to_hex(),
            service_type_id: service.service_type_id.to_hex(),
            category_id: service.category_id.to_hex(),
            name: service.name,
            description: service.description,
            price: service.price,
            discount_price: service.discount_price,
            home_price: service.home_price,
            duration_minutes: service.duration_minutes,
            mode: service.mode,
            audience: service.audience,
            bookings_count: service.bookings_count,
            bookings_count_display: crate::domain::format_count(service.bookings_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(price: f64, discount: Option<f64>, home: Option<f64>) -> Service {
        Service {
            id: ObjectId::new(),
            salon_id: ObjectId::new(),
            service_type_id: ObjectId::new(),
            category_id: ObjectId::new(),
            name: "Classic manicure".to_string(),
            description: None,
            price,
            discount_price: discount,
            home_price: home,
            duration_minutes: 45,
            mode: ServiceMode::Both,
            audience: vec![Audience::Unisex],
            bookings_count: 0,
            is_active: true,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        }
    }

    #[test]
    fn discount_price_wins_in_salon() {
        let service = service(100.0, Some(80.0), Some(140.0));
        assert_eq!(service.effective_price(ServiceMode::ToSalon), 80.0);
    }

    #[test]
    fn home_price_wins_for_home_visits() {
        let service = service(100.0, Some(80.0), Some(140.0));
        assert_eq!(service.effective_price(ServiceMode::ToHome), 140.0);
    }

    #[test]
    fn home_visit_falls_back_to_discount() {
        let service = service(100.0, Some(80.0), None);
        assert_eq!(service.effective_price(ServiceMode::ToHome), 80.0);
    }
}
