use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::Notification;
use crate::search::PageRequest;

use super::repo_error::RepositoryError;

pub(crate) const COLLECTION: &str = "notifications";

#[async_trait]
pub trait NotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError>;
    async fn list_for_user(
        &self,
        user_id: ObjectId,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<Notification>, u64), RepositoryError>;
    async fn unread_count(&self, user_id: ObjectId) -> Result<u64, RepositoryError>;
    /// Marks one notification read, scoped to its owner. False when it does
    /// not exist or belongs to someone else.
    async fn mark_read(&self, id: ObjectId, user_id: ObjectId) -> Result<bool, RepositoryError>;
    async fn mark_all_read(&self, user_id: ObjectId) -> Result<u64, RepositoryError>;
}

#[derive(Clone)]
pub struct NotificationRepositoryImpl {
    notifications: Collection<Notification>,
}

impl NotificationRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            notifications: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn insert(&self, notification: &Notification) -> Result<(), RepositoryError> {
        self.notifications.insert_one(notification).await?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: ObjectId,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<Notification>, u64), RepositoryError> {
        let mut filter = doc! { "userId": user_id };
        if unread_only {
            filter.insert("readAt", doc! { "$exists": false });
        }

        let find = self
            .notifications
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.notifications.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let notifications = cursor.try_collect().await?;
        Ok((notifications, total))
    }

    async fn unread_count(&self, user_id: ObjectId) -> Result<u64, RepositoryError> {
        let count = self
            .notifications
            .count_documents(doc! { "userId": user_id, "readAt": { "$exists": false } })
            .await?;
        Ok(count)
    }

    async fn mark_read(&self, id: ObjectId, user_id: ObjectId) -> Result<bool, RepositoryError> {
        // Re-marking an already-read notification matches and stays read.
        let result = self
            .notifications
            .update_one(
                doc! { "_id": id, "userId": user_id },
                doc! { "$set": { "readAt": DateTime::now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn mark_all_read(&self, user_id: ObjectId) -> Result<u64, RepositoryError> {
        let result = self
            .notifications
            .update_many(
                doc! { "userId": user_id, "readAt": { "$exists": false } },
                doc! { "$set": { "readAt": DateTime::now() } },
            )
            .await?;
        Ok(result.modified_count)
    }
}
