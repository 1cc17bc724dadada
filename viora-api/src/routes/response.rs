use axum::Json;
use serde::Serialize;

use crate::search::{PageMeta, PageRequest};

/// Envelope every endpoint answers with: `success` plus either `data` or a
/// bare message.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            data: None,
            message: Some(message.into()),
        })
    }
}

/// A page of items with its metadata, nested under `data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PageMeta,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            pagination: PageMeta::new(request, total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_omits_empty_fields() {
        let response = ApiResponse::ok(vec![1, 2, 3]);
        let json = serde_json::to_value(&response.0).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][0], 1);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn paginated_carries_metadata() {
        let page = Paginated::new(vec!["a", "b"], PageRequest { page: 1, limit: 2 }, 5);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pagination"]["totalPages"], 3);
        assert_eq!(json["pagination"]["hasNextPage"], true);
        assert_eq!(json["pagination"]["hasPrevPage"], false);
    }
}
