use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::domain::format_count;

/// One weekly recurring slot, `day` is 0 = Sunday through 6 = Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySlot {
    pub day: u8,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeServiceConfig {
    pub enabled: bool,
    #[serde(default)]
    pub area_ids: Vec<ObjectId>,
    #[serde(default)]
    pub fee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<ObjectId>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Service type ids this provider performs.
    #[serde(default)]
    pub specializations: Vec<ObjectId>,
    #[serde(default)]
    pub availability: Vec<AvailabilitySlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_service: Option<HomeServiceConfig>,
    #[serde(default, alias = "rating")]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Provider {
    pub fn serves_home_visits(&self) -> bool {
        self.home_service.as_ref().is_some_and(|config| config.enabled)
    }

    pub fn home_fee(&self) -> f64 {
        self.home_service
            .as_ref()
            .filter(|config| config.enabled)
            .map_or(0.0, |config| config.fee)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<String>,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub specializations: Vec<String>,
    pub availability: Vec<AvailabilitySlot>,
    pub offers_home_service: bool,
    pub home_fee: f64,
    pub average_rating: f64,
    pub rating_count: i64,
    pub rating_count_display: String,
}

impl From<Provider> for ProviderView {
    fn from(provider: Provider) -> Self {
        let offers_home_service = provider.serves_home_visits();
        let home_fee = provider.home_fee();
        Self {
            id: provider.id.to_hex(),
            user_id: provider.user_id.to_hex(),
            salon_id: provider.salon_id.map(|id| id.to_hex()),
            display_name: provider.display_name,
            bio: provider.bio,
            avatar_url: provider.avatar_url,
            specializations: provider
                .specializations
                .iter()
                .map(|id| id.to_hex())
                .collect(),
            availability: provider.availability,
            offers_home_service,
            home_fee,
            average_rating: provider.average_rating,
            rating_count: provider.rating_count,
            rating_count_display: format_count(provider.rating_count),
        }
    }
}
