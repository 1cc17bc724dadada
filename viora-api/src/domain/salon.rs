use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::domain::format_count;

/// GeoJSON point as the 2dsphere index expects it: `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    point_type: PointType,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum PointType {
    Point,
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            point_type: PointType::Point,
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

/// Where a service is fulfilled. `Both` is the universal tag: records carrying
/// it match either specific filter value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Hash,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum ServiceMode {
    ToSalon,
    ToHome,
    Both,
}

/// Clientele a salon or service caters to. `Unisex` is the universal tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Hash,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Audience {
    Men,
    Women,
    Kids,
    Unisex,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Opening hours for one weekday. A `closed` day carries no times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    pub day: Weekday,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,
    #[serde(default)]
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Salon {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub owner_id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub location: GeoPoint,
    #[serde(default)]
    pub hours: Vec<OpeningHours>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city_id: Option<ObjectId>,
    pub mode: ServiceMode,
    #[serde(default)]
    pub audience: Vec<Audience>,
    /// Category and type ids denormalized from the salon's services so list
    /// filters never need a join.
    #[serde(default)]
    pub categories: Vec<ObjectId>,
    #[serde(default)]
    pub service_types: Vec<ObjectId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_level: Option<i32>,
    // Older documents used `rating`, keep accepting it.
    #[serde(default, alias = "rating")]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub bookings_count: i64,
    #[serde(default)]
    pub favorites_count: i64,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Row shape the geo pipeline projects after the area/city lookups.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonSearchHit {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub location: GeoPoint,
    pub mode: ServiceMode,
    #[serde(default)]
    pub audience: Vec<Audience>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub price_level: Option<i32>,
    #[serde(default, alias = "rating")]
    pub average_rating: f64,
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub area_name: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    /// Meters from the search point, rounded by the pipeline.
    pub distance: f64,
}

/// Client-facing salon, hex ids and display counters instead of raw bson.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalonView {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub location: GeoPoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hours: Vec<OpeningHours>,
    pub mode: ServiceMode,
    pub audience: Vec<Audience>,
    pub tags: Vec<String>,
    pub gallery: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_level: Option<i32>,
    pub average_rating: f64,
    pub rating_count: i64,
    pub rating_count_display: String,
    pub popularity_score: f64,
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl From<Salon> for SalonView {
    fn from(salon: Salon) -> Self {
        Self {
            id: salon.id.to_hex(),
            owner_id: Some(salon.owner_id.to_hex()),
            name: salon.name,
            slug: salon.slug,
            description: salon.description,
            address: salon.address,
            location: salon.location,
            hours: salon.hours,
            mode: salon.mode,
            audience: salon.audience,
            tags: salon.tags,
            gallery: salon.gallery,
            price_level: salon.price_level,
            average_rating: salon.average_rating,
            rating_count: salon.rating_count,
            rating_count_display: format_count(salon.rating_count),
            popularity_score: salon.popularity_score,
            is_verified: salon.is_verified,
            area_name: None,
            city_name: None,
            distance: None,
        }
    }
}

impl From<SalonSearchHit> for SalonView {
    fn from(hit: SalonSearchHit) -> Self {
        Self {
            id: hit.id.to_hex(),
            owner_id: None,
            name: hit.name,
            slug: hit.slug,
            description: hit.description,
            address: hit.address,
            location: hit.location,
            hours: Vec::new(),
            mode: hit.mode,
            audience: hit.audience,
            tags: Vec::new(),
            gallery: hit.gallery,
            price_level: hit.price_level,
            average_rating: hit.average_rating,
            rating_count: hit.rating_count,
            rating_count_display: format_count(hit.rating_count),
            popularity_score: hit.popularity_score,
            is_verified: hit.is_verified,
            area_name: hit.area_name,
            city_name: hit.city_name,
            distance: Some(hit.distance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_serializes_longitude_first() {
        let point = GeoPoint::new(55.2708, 25.2048);
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["type"], "Point");
        assert_eq!(json["coordinates"][0], 55.2708);
        assert_eq!(json["coordinates"][1], 25.2048);
    }

    #[test]
    fn mode_round_trips_camel_case() {
        assert_eq!(ServiceMode::ToHome.to_string(), "toHome");
        assert_eq!("toSalon".parse::<ServiceMode>().unwrap(), ServiceMode::ToSalon);
        assert_eq!("BOTH".parse::<ServiceMode>().unwrap(), ServiceMode::Both);
    }

    #[test]
    fn salon_accepts_legacy_rating_field() {
        let doc = bson::doc! {
            "_id": ObjectId::new(),
            "ownerId": ObjectId::new(),
            "name": "Glow Studio",
            "slug": "glow-studio",
            "location": { "type": "Point", "coordinates": [55.27, 25.2] },
            "mode": "both",
            "rating": 4.6,
            "createdAt": DateTime::now(),
            "updatedAt": DateTime::now(),
        };
        let salon: Salon = bson::from_document(doc).unwrap();
        assert_eq!(salon.average_rating, 4.6);
        assert!(salon.hours.is_empty());
    }

    #[test]
    fn closed_day_needs_no_times() {
        let hours: OpeningHours =
            bson::from_document(bson::doc! { "day": "sunday", "closed": true }).unwrap();
        assert_eq!(hours.day, Weekday::Sunday);
        assert!(hours.closed);
        assert_eq!(hours.open, None);

        let json = serde_json::to_value(&hours).unwrap();
        assert!(json.get("open").is_none());
    }
}
