use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonSubRatings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanliness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonReview {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub salon_id: ObjectId,
    pub customer_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<ObjectId>,
    pub rating: f64,
    #[serde(default)]
    pub sub_ratings: SalonSubRatings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime,
}

impl SalonReview {
    pub fn new(
        salon_id: ObjectId,
        customer_id: ObjectId,
        rating: f64,
        comment: Option<String>,
        sub_ratings: Option<SalonSubRatings>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            salon_id,
            customer_id,
            booking_id: None,
            rating,
            sub_ratings: sub_ratings.unwrap_or_default(),
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSubRatings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punctuality: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReview {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub provider_id: ObjectId,
    pub customer_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<ObjectId>,
    pub rating: f64,
    #[serde(default)]
    pub sub_ratings: ProviderSubRatings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime,
}

impl ProviderReview {
    pub fn new(
        provider_id: ObjectId,
        customer_id: ObjectId,
        rating: f64,
        comment: Option<String>,
        sub_ratings: Option<ProviderSubRatings>,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            provider_id,
            customer_id,
            booking_id: None,
            rating,
            sub_ratings: sub_ratings.unwrap_or_default(),
            comment: comment.filter(|c| !c.trim().is_empty()),
            created_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonReviewView {
    pub id: String,
    pub salon_id: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub rating: f64,
    pub sub_ratings: SalonSubRatings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<SalonReview> for SalonReviewView {
    fn from(review: SalonReview) -> Self {
        Self {
            id: review.id.to_hex(),
            salon_id: review.salon_id.to_hex(),
            customer_id: review.customer_id.to_hex(),
            booking_id: review.booking_id.map(|id| id.to_hex()),
            rating: review.rating,
            sub_ratings: review.sub_ratings,
            comment: review.comment,
            created_at: review.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderReviewView {
    pub id: String,
    pub provider_id: String,
    pub customer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub rating: f64,
    pub sub_ratings: ProviderSubRatings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ProviderReview> for ProviderReviewView {
    fn from(review: ProviderReview) -> Self {
        Self {
            id: review.id.to_hex(),
            provider_id: review.provider_id.to_hex(),
            customer_id: review.customer_id.to_hex(),
            booking_id: review.booking_id.map(|id| id.to_hex()),
            rating: review.rating,
            sub_ratings: review.sub_ratings,
            comment: review.comment,
            created_at: review.created_at.to_chrono(),
        }
    }
}
