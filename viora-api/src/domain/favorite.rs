use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub salon_id: ObjectId,
    pub created_at: DateTime,
}

impl Favorite {
    pub fn new(user_id: ObjectId, salon_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            salon_id,
            created_at: DateTime::now(),
        }
    }
}
