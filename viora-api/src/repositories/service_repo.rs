use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::Service;
use crate::search::{PageRequest, ServiceFilter, SortSpec};

use super::repo_error::RepositoryError;

pub(crate) const COLLECTION: &str = "services";

#[async_trait]
pub trait ServiceRepository {
    async fn list(
        &self,
        filter: &ServiceFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<Service>, u64), RepositoryError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Service>, RepositoryError>;
    /// Active services among `ids`, order unspecified.
    async fn find_active_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Service>, RepositoryError>;
    async fn list_for_salon(&self, salon_id: ObjectId) -> Result<Vec<Service>, RepositoryError>;
    async fn increment_bookings(&self, ids: &[ObjectId]) -> Result<(), RepositoryError>;
}

#[derive(Clone)]
pub struct ServiceRepositoryImpl {
    services: Collection<Service>,
}

impl ServiceRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            services: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl ServiceRepository for ServiceRepositoryImpl {
    async fn list(
        &self,
        filter: &ServiceFilter,
        sort: &SortSpec,
        page: &PageRequest,
    ) -> Result<(Vec<Service>, u64), RepositoryError> {
        let filter = filter.to_document();

        let find = self
            .services
            .find(filter.clone())
            .sort(sort.to_document())
            .skip(page.skip())
            .limit(page.limit);
        let count = self.services.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let items = cursor.try_collect().await?;
        Ok((items, total))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Service>, RepositoryError> {
        let service = self.services.find_one(doc! { "_id": id }).await?;
        Ok(service)
    }

    async fn find_active_by_ids(&self, ids: &[ObjectId]) -> Result<Vec<Service>, RepositoryError> {
        let cursor = self
            .services
            .find(doc! { "_id": { "$in": ids }, "isActive": true })
            .await?;
        let services = cursor.try_collect().await?;
        Ok(services)
    }

    async fn list_for_salon(&self, salon_id: ObjectId) -> Result<Vec<Service>, RepositoryError> {
        let cursor = self
            .services
            .find(doc! { "salonId": salon_id, "isActive": true })
            .sort(doc! { "price": 1 })
            .await?;
        let services = cursor.try_collect().await?;
        Ok(services)
    }

    async fn increment_bookings(&self, ids: &[ObjectId]) -> Result<(), RepositoryError> {
        self.services
            .update_many(
                doc! { "_id": { "$in": ids } },
                doc! {
                    "$inc": { "bookingsCount": 1_i64 },
                    "$currentDate": { "updatedAt": true },
                },
            )
            .await?;
        Ok(())
    }
}
