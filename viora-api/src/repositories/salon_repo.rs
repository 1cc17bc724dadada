use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};
use serde::Deserialize;

use crate::domain::{Salon, SalonSearchHit};
use crate::search::{geo_salon_pipeline, GeoQuery, PageRequest, SalonFilter, SortSpec};

use super::repo_error::RepositoryError;

pub(crate) const COLLECTION: &str = "salons";

#[async_trait]
pub trait SalonRepository {
    async fn list(
        &self,
        filter: &SalonFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<Salon>, u64), RepositoryError>;
    async fn search_nearby(
        &self,
        geo: &GeoQuery,
        filter: &SalonFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<SalonSearchHit>, u64), RepositoryError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Salon>, RepositoryError>;
    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Salon>, RepositoryError>;
    async fn increment_bookings(&self, id: ObjectId) -> Result<(), RepositoryError>;
    async fn adjust_favorites(&self, id: ObjectId, delta: i64) -> Result<(), RepositoryError>;
    async fn set_rating_stats(
        &self,
        id: ObjectId,
        average_rating: f64,
        rating_count: i64,
        popularity_score: f64,
    ) -> Result<(), RepositoryError>;
}

#[derive(Clone)]
pub struct SalonRepositoryImpl {
    salons: Collection<Salon>,
}

impl SalonRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            salons: db.collection(COLLECTION),
        }
    }
}

/// `$facet` output: one document holding the page and the count.
#[derive(Debug, Deserialize)]
struct FacetPage {
    #[serde(default)]
    items: Vec<Document>,
    #[serde(default)]
    total: Vec<CountRow>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[async_trait]
impl SalonRepository for SalonRepositoryImpl {
    async fn list(
        &self,
        filter: &SalonFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<Salon>, u64), RepositoryError> {
        let filter = filter.to_document();

        let find = self
            .salons
            .find(filter.clone())
            .sort(sort.to_document())
            .skip(page.skip())
            .limit(page.limit);
        let count = self.salons.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let items = cursor.try_collect().await?;
        Ok((items, total))
    }

    async fn search_nearby(
        &self,
        geo: &GeoQuery,
        filter: &SalonFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<SalonSearchHit>, u64), RepositoryError> {
        let pipeline = geo_salon_pipeline(geo, &filter.to_document(), sort, page);

        let mut cursor = self.salons.aggregate(pipeline).await?;
        let Some(facet) = cursor.try_next().await? else {
            return Ok((Vec::new(), 0));
        };

        let facet: FacetPage = bson::from_document(facet)?;
        let total = facet.total.first().map_or(0, |row| row.count as u64);
        let items = facet
            .items
            .into_iter()
            .map(bson::from_document)
            .collect::<Result<Vec<SalonSearchHit>, _>>()?;
        Ok((items, total))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Salon>, RepositoryError> {
        let salon = self.salons.find_one(doc! { "_id": id }).await?;
        Ok(salon)
    }

    async fn find_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Salon>, RepositoryError> {
        let cursor = self
            .salons
            .find(doc! { "_id": { "$in": ids } })
            .await?;
        let salons = cursor.try_collect().await?;
        Ok(salons)
    }

    async fn increment_bookings(&self, id: ObjectId) -> Result<(), RepositoryError> {
        self.salons
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$inc": { "bookingsCount": 1_i64 },
                    "$currentDate": { "updatedAt": true },
                },
            )
            .await?;
        Ok(())
    }

    async fn adjust_favorites(&self, id: ObjectId, delta: i64) -> Result<(), RepositoryError> {
        self.salons
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$inc": { "favoritesCount": delta },
                    "$currentDate": { "updatedAt": true },
                },
            )
            .await?;
        Ok(())
    }

    async fn set_rating_stats(
        &self,
        id: ObjectId,
        average_rating: f64,
        rating_count: i64,
        popularity_score: f64,
    ) -> Result<(), RepositoryError> {
        self.salons
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "averageRating": average_rating,
                        "ratingCount": rating_count,
                        "popularityScore": popularity_score,
                    },
                    "$currentDate": { "updatedAt": true },
                },
            )
            .await?;
        Ok(())
    }
}
