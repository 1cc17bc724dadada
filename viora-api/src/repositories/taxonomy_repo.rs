use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};

use crate::domain::{ServiceCategory, ServiceType};

use super::repo_error::RepositoryError;

pub(crate) const CATEGORIES: &str = "serviceCategories";
pub(crate) const TYPES: &str = "serviceTypes";

#[async_trait]
pub trait TaxonomyRepository {
    async fn list_categories(&self) -> Result<Vec<ServiceCategory>, RepositoryError>;
    async fn list_types(
        &self,
        category_id: Option<ObjectId>,
    ) -> Result<Vec<ServiceType>, RepositoryError>;
    /// Accepts either a hex id or a slug, so clients can link by name.
    async fn resolve_category(&self, reference: &str) -> Result<ServiceCategory, RepositoryError>;
    async fn resolve_type(&self, reference: &str) -> Result<ServiceType, RepositoryError>;
}

#[derive(Clone)]
pub struct TaxonomyRepositoryImpl {
    categories: Collection<ServiceCategory>,
    types: Collection<ServiceType>,
}

impl TaxonomyRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            categories: db.collection(CATEGORIES),
            types: db.collection(TYPES),
        }
    }
}

fn reference_filter(reference: &str) -> bson::Document {
    match ObjectId::parse_str(reference) {
        Ok(id) => doc! { "_id": id, "isActive": true },
        Err(_) => doc! { "slug": reference, "isActive": true },
    }
}

#[async_trait]
impl TaxonomyRepository for TaxonomyRepositoryImpl {
    async fn list_categories(&self) -> Result<Vec<ServiceCategory>, RepositoryError> {
        let cursor = self
            .categories
            .find(doc! { "isActive": true })
            .sort(doc! { "position": 1, "name": 1 })
            .await?;
        let categories = cursor.try_collect().await?;
        Ok(categories)
    }

    async fn list_types(
        &self,
        category_id: Option<ObjectId>,
    ) -> Result<Vec<ServiceType>, RepositoryError> {
        let mut filter = doc! { "isActive": true };
        if let Some(category_id) = category_id {
            filter.insert("categoryId", category_id);
        }
        let cursor = self.types.find(filter).sort(doc! { "name": 1 }).await?;
        let types = cursor.try_collect().await?;
        Ok(types)
    }

    async fn resolve_category(&self, reference: &str) -> Result<ServiceCategory, RepositoryError> {
        self.categories
            .find_one(reference_filter(reference))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("category '{reference}'")))
    }

    async fn resolve_type(&self, reference: &str) -> Result<ServiceType, RepositoryError> {
        self.types
            .find_one(reference_filter(reference))
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("service type '{reference}'")))
    }
}
