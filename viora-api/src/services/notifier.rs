use std::sync::Arc;

use courier::{CourierClient, Message};
use mongodb::Database;

use crate::config::CourierSettings;
use crate::domain::Notification;
use crate::repositories::{NotificationRepository, NotificationRepositoryImpl};

/// Stores the in-app copy of a notification and pushes it through the
/// courier. Failures are logged, never surfaced: a booking must not fail
/// because a notification could not be delivered.
pub struct Notifier {
    notifications: NotificationRepositoryImpl,
    courier: Option<Arc<CourierClient>>,
}

impl Notifier {
    pub fn new(db: Database, settings: &CourierSettings) -> Self {
        let courier = settings
            .enabled
            .then(|| Arc::new(CourierClient::new(&settings.base_url, &settings.api_key)));
        Self {
            notifications: NotificationRepositoryImpl::new(db),
            courier,
        }
    }

    pub async fn dispatch(&self, notification: Notification) {
        let push = Self::to_push(&notification);

        if let Err(error) = self.notifications.insert(&notification).await {
            tracing::error!(
                "Failed to store notification for user {}: {}",
                notification.user_id,
                error
            );
        }

        if let Some(courier) = &self.courier {
            let courier = Arc::clone(courier);
            tokio::spawn(async move {
                match courier.deliver(&push).await {
                    Ok(receipt) => {
                        tracing::info!("Courier accepted {} message {}", push.channel(), receipt.id);
                    }
                    Err(error) => {
                        tracing::error!("Courier rejected {} message: {}", push.channel(), error);
                    }
                }
            });
        }
    }

    fn to_push(notification: &Notification) -> Message {
        let message = Message::push(
            notification.user_id.to_hex(),
            notification.title.clone(),
            notification.body.clone(),
        );
        match notification.booking_id {
            Some(booking_id) => message.with_reference(booking_id.to_hex()),
            None => message,
        }
    }
}
