use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::Provider;
use crate::search::{PageRequest, SortSpec};

use super::repo_error::RepositoryError;

pub(crate) const COLLECTION: &str = "providers";

/// Provider listing criteria. Narrower than the salon filter, providers are
/// browsed by salon, specialization and home-visit capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderQuery {
    pub salon_id: Option<ObjectId>,
    pub specialization: Option<ObjectId>,
    pub home_service_only: bool,
    pub min_rating: Option<f64>,
}

impl ProviderQuery {
    pub fn to_document(&self) -> Document {
        let mut filter = doc! { "isActive": true };
        if let Some(salon_id) = self.salon_id {
            filter.insert("salonId", salon_id);
        }
        if let Some(specialization) = self.specialization {
            filter.insert("specializations", specialization);
        }
        if self.home_service_only {
            filter.insert("homeService.enabled", true);
        }
        if let Some(min_rating) = self.min_rating {
            filter.insert("averageRating", doc! { "$gte": min_rating });
        }
        filter
    }
}

#[async_trait]
pub trait ProviderRepository {
    async fn list(
        &self,
        query: &ProviderQuery,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<Provider>, u64), RepositoryError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Provider>, RepositoryError>;
    async fn list_for_salon(&self, salon_id: ObjectId) -> Result<Vec<Provider>, RepositoryError>;
    async fn set_rating_stats(
        &self,
        id: ObjectId,
        average_rating: f64,
        rating_count: i64,
    ) -> Result<(), RepositoryError>;
}

#[derive(Clone)]
pub struct ProviderRepositoryImpl {
    providers: Collection<Provider>,
}

impl ProviderRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            providers: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl ProviderRepository for ProviderRepositoryImpl {
    async fn list(
        &self,
        query: &ProviderQuery,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<Provider>, u64), RepositoryError> {
        let filter = query.to_document();

        let find = self
            .providers
            .find(filter.clone())
            .sort(sort.to_document())
            .skip(page.skip())
            .limit(page.limit);
        let count = self.providers.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let providers = cursor.try_collect().await?;
        Ok((providers, total))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Provider>, RepositoryError> {
        let provider = self.providers.find_one(doc! { "_id": id }).await?;
        Ok(provider)
    }

    async fn list_for_salon(&self, salon_id: ObjectId) -> Result<Vec<Provider>, RepositoryError> {
        let cursor = self
            .providers
            .find(doc! { "salonId": salon_id, "isActive": true })
            .sort(doc! { "averageRating": -1 })
            .await?;
        let providers = cursor.try_collect().await?;
        Ok(providers)
    }

    async fn set_rating_stats(
        &self,
        id: ObjectId,
        average_rating: f64,
        rating_count: i64,
    ) -> Result<(), RepositoryError> {
        self.providers
            .update_one(
                doc! { "_id": id },
                doc! {
                    "$set": {
                        "averageRating": average_rating,
                        "ratingCount": rating_count,
                    },
                    "$currentDate": { "updatedAt": true },
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_to_active_only() {
        assert_eq!(ProviderQuery::default().to_document(), doc! { "isActive": true });
    }

    #[test]
    fn home_service_flag_targets_the_nested_field() {
        let query = ProviderQuery {
            home_service_only: true,
            ..Default::default()
        };
        assert_eq!(
            query.to_document(),
            doc! { "isActive": true, "homeService.enabled": true }
        );
    }
}
