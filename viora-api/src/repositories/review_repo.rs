use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};
use serde::Deserialize;

use crate::domain::{ProviderReview, SalonReview};
use crate::search::PageRequest;

use super::repo_error::RepositoryError;

pub(crate) const SALON_REVIEWS: &str = "salonReviews";
pub(crate) const PROVIDER_REVIEWS: &str = "providerReviews";

/// Recomputed aggregate over a review set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
    pub average: f64,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
struct RatingStatsRow {
    average: f64,
    count: i64,
}

#[async_trait]
pub trait ReviewRepository {
    async fn insert_salon_review(&self, review: &SalonReview) -> Result<(), RepositoryError>;
    async fn list_salon_reviews(
        &self,
        salon_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<SalonReview>, u64), RepositoryError>;
    async fn salon_rating_stats(&self, salon_id: ObjectId) -> Result<RatingStats, RepositoryError>;
    async fn insert_provider_review(&self, review: &ProviderReview)
        -> Result<(), RepositoryError>;
    async fn list_provider_reviews(
        &self,
        provider_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<ProviderReview>, u64), RepositoryError>;
    async fn provider_rating_stats(
        &self,
        provider_id: ObjectId,
    ) -> Result<RatingStats, RepositoryError>;
}

#[derive(Clone)]
pub struct ReviewRepositoryImpl {
    salon_reviews: Collection<SalonReview>,
    provider_reviews: Collection<ProviderReview>,
}

impl ReviewRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            salon_reviews: db.collection(SALON_REVIEWS),
            provider_reviews: db.collection(PROVIDER_REVIEWS),
        }
    }
}

/// `$group` averaging the rating over every review of one subject.
fn stats_pipeline(key: &str, id: ObjectId) -> Vec<bson::Document> {
    vec![
        doc! { "$match": { key: id } },
        doc! { "$group": {
            "_id": null,
            "average": { "$avg": "$rating" },
            "count": { "$sum": 1 },
        } },
    ]
}

#[async_trait]
impl ReviewRepository for ReviewRepositoryImpl {
    async fn insert_salon_review(&self, review: &SalonReview) -> Result<(), RepositoryError> {
        self.salon_reviews.insert_one(review).await?;
        Ok(())
    }

    async fn list_salon_reviews(
        &self,
        salon_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<SalonReview>, u64), RepositoryError> {
        let filter = doc! { "salonId": salon_id };

        let find = self
            .salon_reviews
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.salon_reviews.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let reviews = cursor.try_collect().await?;
        Ok((reviews, total))
    }

    async fn salon_rating_stats(&self, salon_id: ObjectId) -> Result<RatingStats, RepositoryError> {
        let mut cursor = self
            .salon_reviews
            .aggregate(stats_pipeline("salonId", salon_id))
            .await?;
        let Some(row) = cursor.try_next().await? else {
            return Ok(RatingStats {
                average: 0.0,
                count: 0,
            });
        };
        let row: RatingStatsRow = bson::from_document(row)?;
        Ok(RatingStats {
            average: row.average,
            count: row.count,
        })
    }

    async fn insert_provider_review(
        &self,
        review: &ProviderReview,
    ) -> Result<(), RepositoryError> {
        self.provider_reviews.insert_one(review).await?;
        Ok(())
    }

    async fn list_provider_reviews(
        &self,
        provider_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<ProviderReview>, u64), RepositoryError> {
        let filter = doc! { "providerId": provider_id };

        let find = self
            .provider_reviews
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.provider_reviews.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let reviews = cursor.try_collect().await?;
        Ok((reviews, total))
    }

    async fn provider_rating_stats(
        &self,
        provider_id: ObjectId,
    ) -> Result<RatingStats, RepositoryError> {
        let mut cursor = self
            .provider_reviews
            .aggregate(stats_pipeline("providerId", provider_id))
            .await?;
        let Some(row) = cursor.try_next().await? else {
            return Ok(RatingStats {
                average: 0.0,
                count: 0,
            });
        };
        let row: RatingStatsRow = bson::from_document(row)?;
        Ok(RatingStats {
            average: row.average,
            count: row.count,
        })
    }
}
