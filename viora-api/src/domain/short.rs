use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::domain::format_count;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Short {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub author_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<ObjectId>,
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tags: Vec<String>,
    // Earlier documents pluralized the counter names.
    #[serde(default, alias = "viewsCount")]
    pub view_count: i64,
    #[serde(default, alias = "likesCount")]
    pub like_count: i64,
    #[serde(default, alias = "commentsCount")]
    pub comment_count: i64,
    #[serde(default, alias = "bookmarksCount")]
    pub bookmark_count: i64,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortLike {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub short_id: ObjectId,
    pub user_id: ObjectId,
    pub created_at: DateTime,
}

impl ShortLike {
    pub fn new(short_id: ObjectId, user_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            short_id,
            user_id,
            created_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortBookmark {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub short_id: ObjectId,
    pub user_id: ObjectId,
    pub created_at: DateTime,
}

impl ShortBookmark {
    pub fn new(short_id: ObjectId, user_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            short_id,
            user_id,
            created_at: DateTime::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortComment {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub short_id: ObjectId,
    pub user_id: ObjectId,
    pub text: String,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub follower_id: ObjectId,
    pub author_id: ObjectId,
    pub created_at: DateTime,
}

impl Follow {
    pub fn new(follower_id: ObjectId, author_id: ObjectId) -> Self {
        Self {
            id: ObjectId::new(),
            follower_id,
            author_id,
            created_at: DateTime::now(),
        }
    }
}

/// Feed item with both raw counters (for clients that sort or diff) and the
/// abbreviated display strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortView {
    pub id: String,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salon_id: Option<String>,
    pub video_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub caption: String,
    pub tags: Vec<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub bookmark_count: i64,
    pub view_count_display: String,
    pub like_count_display: String,
    pub comment_count_display: String,
    pub bookmark_count_display: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Short> for ShortView {
    fn from(short: Short) -> Self {
        Self {
            id: short.id.to_hex(),
            author_id: short.author_id.to_hex(),
            salon_id: short.salon_id.map(|id| id.to_hex()),
            video_url: short.video_url,
            thumbnail_url: short.thumbnail_url,
            caption: short.caption,
            tags: short.tags,
            view_count: short.view_count,
            like_count: short.like_count,
            comment_count: short.comment_count,
            bookmark_count: short.bookmark_count,
            view_count_display: format_count(short.view_count),
            like_count_display: format_count(short.like_count),
            comment_count_display: format_count(short.comment_count),
            bookmark_count_display: format_count(short.bookmark_count),
            created_at: short.created_at.to_chrono(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortCommentView {
    pub id: String,
    pub user_id: String,
    pub text: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<ShortComment> for ShortCommentView {
    fn from(comment: ShortComment) -> Self {
        Self {
            id: comment.id.to_hex(),
            user_id: comment.user_id.to_hex(),
            text: comment.text,
            created_at: comment.created_at.to_chrono(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_counter_names_still_deserialize() {
        let doc = bson::doc! {
            "_id": ObjectId::new(),
            "authorId": ObjectId::new(),
            "videoUrl": "https://cdn.example.com/v/1.mp4",
            "viewsCount": 1500_i64,
            "likesCount": 42_i64,
            "isActive": true,
            "createdAt": DateTime::now(),
            "updatedAt": DateTime::now(),
        };
        let short: Short = bson::from_document(doc).unwrap();
        assert_eq!(short.view_count, 1500);
        assert_eq!(short.like_count, 42);
        assert_eq!(short.comment_count, 0);
    }

    #[test]
    fn view_abbreviates_counters() {
        let short = Short {
            id: ObjectId::new(),
            author_id: ObjectId::new(),
            salon_id: None,
            video_url: "https://cdn.example.com/v/2.mp4".to_string(),
            thumbnail_url: None,
            caption: String::new(),
            tags: vec![],
            view_count: 2_300_000,
            like_count: 1_500,
            comment_count: 950,
            bookmark_count: 1_000_000,
            is_active: true,
            created_at: DateTime::now(),
            updated_at: DateTime::now(),
        };
        let view = ShortView::from(short);
        assert_eq!(view.view_count_display, "2.3M");
        assert_eq!(view.like_count_display, "1.5K");
        assert_eq!(view.comment_count_display, "950");
        assert_eq!(view.bookmark_count_display, "1M");
        assert_eq!(view.view_count, 2_300_000);
    }
}
