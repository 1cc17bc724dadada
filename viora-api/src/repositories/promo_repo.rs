use async_trait::async_trait;
use bson::doc;
use mongodb::{Collection, Database};

use crate::domain::PromoCode;

use super::repo_error::RepositoryError;

pub(crate) const COLLECTION: &str = "promoCodes";

#[async_trait]
pub trait PromoRepository {
    /// Lookup is case-insensitive: codes are stored uppercase.
    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, RepositoryError>;
    /// Burns one use, guarded so the counter can never pass `maxUses` even
    /// under concurrent redemptions. False when the cap was already hit.
    async fn redeem(&self, code: &str) -> Result<bool, RepositoryError>;
}

#[derive(Clone)]
pub struct PromoRepositoryImpl {
    promos: Collection<PromoCode>,
}

impl PromoRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            promos: db.collection(COLLECTION),
        }
    }
}

#[async_trait]
impl PromoRepository for PromoRepositoryImpl {
    async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, RepositoryError> {
        let promo = self
            .promos
            .find_one(doc! { "code": code.trim().to_uppercase() })
            .await?;
        Ok(promo)
    }

    async fn redeem(&self, code: &str) -> Result<bool, RepositoryError> {
        let filter = doc! {
            "code": code.trim().to_uppercase(),
            "isActive": true,
            "$or": [
                { "maxUses": { "$exists": false } },
                { "$expr": { "$lt": ["$usedCount", "$maxUses"] } },
            ],
        };
        let result = self
            .promos
            .update_one(filter, doc! { "$inc": { "usedCount": 1_i64 } })
            .await?;
        Ok(result.modified_count > 0)
    }
}
