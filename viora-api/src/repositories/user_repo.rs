use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::{Address, User};

use super::repo_error::RepositoryError;

pub(crate) const USERS: &str = "users";
pub(crate) const ADDRESSES: &str = "addresses";

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.avatar_url.is_none()
    }
}

#[async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, RepositoryError>;
    async fn update_profile(
        &self,
        id: ObjectId,
        patch: &ProfilePatch,
    ) -> Result<Option<User>, RepositoryError>;
    async fn list_addresses(&self, user_id: ObjectId) -> Result<Vec<Address>, RepositoryError>;
    async fn insert_address(&self, address: &Address) -> Result<(), RepositoryError>;
    /// Makes `id` the default and clears the flag everywhere else.
    async fn set_default_address(
        &self,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<bool, RepositoryError>;
    async fn delete_address(&self, user_id: ObjectId, id: ObjectId)
        -> Result<bool, RepositoryError>;
    async fn find_address(
        &self,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<Option<Address>, RepositoryError>;
}

#[derive(Clone)]
pub struct UserRepositoryImpl {
    users: Collection<User>,
    addresses: Collection<Address>,
}

impl UserRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            users: db.collection(USERS),
            addresses: db.collection(ADDRESSES),
        }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, RepositoryError> {
        let user = self.users.find_one(doc! { "_id": id }).await?;
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: ObjectId,
        patch: &ProfilePatch,
    ) -> Result<Option<User>, RepositoryError> {
        let mut set = bson::Document::new();
        if let Some(name) = &patch.name {
            set.insert("name", name);
        }
        if let Some(phone) = &patch.phone {
            set.insert("phone", phone);
        }
        if let Some(avatar_url) = &patch.avatar_url {
            set.insert("avatarUrl", avatar_url);
        }

        let user = self
            .users
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": set, "$currentDate": { "updatedAt": true } },
            )
            .return_document(mongodb::options::ReturnDocument::After)
            .await?;
        Ok(user)
    }

    async fn list_addresses(&self, user_id: ObjectId) -> Result<Vec<Address>, RepositoryError> {
        let cursor = self
            .addresses
            .find(doc! { "userId": user_id })
            .sort(doc! { "isDefault": -1, "createdAt": -1 })
            .await?;
        let addresses = cursor.try_collect().await?;
        Ok(addresses)
    }

    async fn insert_address(&self, address: &Address) -> Result<(), RepositoryError> {
        if address.is_default {
            self.addresses
                .update_many(
                    doc! { "userId": address.user_id, "isDefault": true },
                    doc! { "$set": { "isDefault": false } },
                )
                .await?;
        }
        self.addresses.insert_one(address).await?;
        Ok(())
    }

    async fn set_default_address(
        &self,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .addresses
            .update_one(
                doc! { "_id": id, "userId": user_id },
                doc! { "$set": { "isDefault": true } },
            )
            .await?;
        if result.matched_count == 0 {
            return Ok(false);
        }
        self.addresses
            .update_many(
                doc! { "userId": user_id, "_id": { "$ne": id } },
                doc! { "$set": { "isDefault": false } },
            )
            .await?;
        Ok(true)
    }

    async fn delete_address(
        &self,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<bool, RepositoryError> {
        let result = self
            .addresses
            .delete_one(doc! { "_id": id, "userId": user_id })
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_address(
        &self,
        user_id: ObjectId,
        id: ObjectId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = self
            .addresses
            .find_one(doc! { "_id": id, "userId": user_id })
            .await?;
        Ok(address)
    }
}
