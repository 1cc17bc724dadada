use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::domain::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub slug: String,
    pub center: GeoPoint,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub city_id: ObjectId,
    pub name: String,
    pub slug: String,
    pub center: GeoPoint,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityView {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub center: GeoPoint,
}

impl From<City> for CityView {
    fn from(city: City) -> Self {
        Self {
            id: city.id.to_hex(),
            name: city.name,
            slug: city.slug,
            center: city.center,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaView {
    pub id: String,
    pub city_id: String,
    pub name: String,
    pub slug: String,
    pub center: GeoPoint,
}

impl From<Area> for AreaView {
    fn from(area: Area) -> Self {
        Self {
            id: area.id.to_hex(),
            city_id: area.city_id.to_hex(),
            name: area.name,
            slug: area.slug,
            center: area.center,
        }
    }
}
