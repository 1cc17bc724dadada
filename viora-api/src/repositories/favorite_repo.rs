use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::Favorite;
use crate::search::PageRequest;

use super::repo_error::{is_duplicate_key, RepositoryError};

pub(crate) const COLLECTION: &str = "favorites";

#[async_trait]
pub trait FavoriteRepository {
    /// Errors with [`RepositoryError::AlreadyExists`] when this user already
    /// favorited the salon, the unique index is the source of truth.
    async fn insert(&self, favorite: &Favorite) -> Result<(), RepositoryError>;
    async fn remove(&self, user_id: ObjectId, salon_id: ObjectId)
        -> Result<bool, RepositoryError>;
    async fn list_for_user(
        &self,
        user_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<Favorite>, u64), RepositoryError>;
    async fn is_favorite(
        &self,
        user_id: ObjectId,
        salon_id: ObjectId,
    ) -> Result<bool, RepositoryError>;
}

#[derive(Clone)]
pub struct FavoriteRepositoryImpl {
    favorites: Collection<Favorite>,
}

impl FavoriteRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            favorites: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl FavoriteRepository for FavoriteRepositoryImpl {
    async fn insert(&self, favorite: &Favorite) -> Result<(), RepositoryError> {
        match self.favorites.insert_one(favorite).await {
            Ok(_) => Ok(()),
            Err(error) if is_duplicate_key(&error) => Err(RepositoryError::AlreadyExists(
                "salon is already in favorites".to_string(),
            )),
            Err(error) => Err(error.into()),
        }
    }

    async fn remove(
        &self,
        user_id: ObjectId,
        salon_id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .favorites
            .delete_one(doc! { "userId": user_id, "salonId": salon_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_for_user(
        &self,
        user_id: ObjectId,
        page: &PageRequest,
    ) -> Result<(Vec<Favorite>, u64), RepositoryError> {
        let filter = doc! { "userId": user_id };

        let find = self
            .favorites
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.favorites.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let favorites = cursor.try_collect().await?;
        Ok((favorites, total))
    }

    async fn is_favorite(
        &self,
        user_id: ObjectId,
        salon_id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let found = self
            .favorites
            .find_one(doc! { "userId": user_id, "salonId": salon_id })
            .await?;
        Ok(found.is_some())
    }
}
