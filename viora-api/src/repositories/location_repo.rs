use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::{Area, City};

use super::repo_error::RepositoryError;

pub(crate) const CITIES: &str = "cities";
pub(crate) const AREAS: &str = "areas";

#[async_trait]
pub trait LocationRepository {
    async fn list_cities(&self) -> Result<Vec<City>, RepositoryError>;
    async fn list_areas(&self, city_id: ObjectId) -> Result<Vec<Area>, RepositoryError>;
    async fn resolve_city(&self, reference: &str) -> Result<City, RepositoryError>;
    async fn find_city(&self, id: ObjectId) -> Result<Option<City>, RepositoryError>;
    async fn find_area(&self, id: ObjectId) -> Result<Option<Area>, RepositoryError>;
}

#[derive(Clone)]
pub struct LocationRepositoryImpl {
    cities: Collection<City>,
    areas: Collection<Area>,
}

impl LocationRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            cities: db.collection(CITIES),
            areas: db.collection(AREAS),
        }
    }
}

#[async_trait]
impl LocationRepository for LocationRepositoryImpl {
    async fn list_cities(&self) -> Result<Vec<City>, RepositoryError> {
        let cursor = self
            .cities
            .find(doc! { "isActive": true })
            .sort(doc! { "name": 1 })
            .await?;
        let cities = cursor.try_collect().await?;
        Ok(cities)
    }

    async fn list_areas(&self, city_id: ObjectId) -> Result<Vec<Area>, RepositoryError> {
        let cursor = self
            .areas
            .find(doc! { "cityId": city_id, "isActive": true })
            .sort(doc! { "name": 1 })
            .await?;
        let areas = cursor.try_collect().await?;
        Ok(areas)
    }

    async fn resolve_city(&self, reference: &str) -> Result<City, RepositoryError> {
        let filter = match ObjectId::parse_str(reference) {
            Ok(id) => doc! { "_id": id, "isActive": true },
            Err(_) => doc! { "slug": reference, "isActive": true },
        };
        self.cities
            .find_one(filter)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("city '{reference}'")))
    }

    async fn find_city(&self, id: ObjectId) -> Result<Option<City>, RepositoryError> {
        let city = self.cities.find_one(doc! { "_id": id }).await?;
        Ok(city)
    }

    async fn find_area(&self, id: ObjectId) -> Result<Option<Area>, RepositoryError> {
        let area = self.areas.find_one(doc! { "_id": id }).await?;
        Ok(area)
    }
}
