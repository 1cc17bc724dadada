use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NotificationKind {
    Booking,
    Promo,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
}

impl Notification {
    pub fn new(user_id: ObjectId, kind: NotificationKind, title: String, body: String) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            kind,
            title,
            body,
            booking_id: None,
            read_at: None,
            created_at: DateTime::now(),
        }
    }

    pub fn about_booking(mut self, booking_id: ObjectId) -> Self {
        self.booking_id = Some(booking_id);
        self
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Notification> for NotificationView {
    fn from(notification: Notification) -> Self {
        let is_read = notification.is_read();
        Self {
            id: notification.id.to_hex(),
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            booking_id: notification.booking_id.map(|id| id.to_hex()),
            is_read,
            created_at: notification.created_at.to_chrono(),
        }
    }
}
