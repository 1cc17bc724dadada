use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::domain::ServiceMode;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    /// States reachable from this one. Terminal states return the empty slice.
    pub fn allowed_transitions(self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[InProgress, Cancelled, NoShow],
            InProgress => &[Completed, Cancelled],
            Completed | Cancelled | NoShow => &[],
        }
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingItem {
    pub service_id: ObjectId,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub home_fee: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub booking_number: String,
    pub customer_id: ObjectId,
    pub salon_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ObjectId>,
    pub items: Vec<BookingItem>,
    pub scheduled_at: DateTime,
    /// Fulfillment chosen for this booking, only `toSalon` or `toHome`.
    pub mode: ServiceMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_id: Option<ObjectId>,
    pub totals: BookingTotals,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: String,
    pub booking_number: String,
    pub customer_id: String,
    pub salon_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub items: Vec<BookingItemView>,
    pub scheduled_at: chrono::DateTime<chrono::Utc>,
    pub mode: ServiceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_id: Option<String>,
    pub totals: BookingTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,
    pub status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingItemView {
    pub service_id: String,
    pub name: String,
    pub price: f64,
}

impl From<Booking> for BookingView {
    fn from(booking: Booking) -> Self {
        Self {
            id: booking.id.to_hex(),
            booking_number: booking.booking_number,
            customer_id: booking.customer_id.to_hex(),
            salon_id: booking.salon_id.to_hex(),
            provider_id: booking.provider_id.map(|id| id.to_hex()),
            items: booking
                .items
                .into_iter()
                .map(|item| BookingItemView {
                    service_id: item.service_id.to_hex(),
                    name: item.name,
                    price: item.price,
                })
                .collect(),
            scheduled_at: booking.scheduled_at.to_chrono(),
            mode: booking.mode,
            address_id: booking.address_id.map(|id| id.to_hex()),
            totals: booking.totals,
            promo_code: booking.promo_code,
            status: booking.status,
            cancellation_reason: booking.cancellation_reason,
            created_at: booking.created_at.to_chrono(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BookingStatus::*;

    #[test]
    fn pending_can_be_confirmed_or_cancelled() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(NoShow));
    }

    #[test]
    fn confirmed_can_start_cancel_or_no_show() {
        assert!(Confirmed.can_transition_to(InProgress));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(NoShow));
        assert!(!Confirmed.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn in_progress_can_complete_or_cancel() {
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Cancelled));
        assert!(!InProgress.can_transition_to(NoShow));
        assert!(!InProgress.can_transition_to(Confirmed));
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for terminal in [Completed, Cancelled, NoShow] {
            assert!(terminal.is_terminal());
            for next in [Pending, Confirmed, InProgress, Completed, Cancelled, NoShow] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_state_transitions_to_itself() {
        for status in [Pending, Confirmed, InProgress, Completed, Cancelled, NoShow] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(NoShow.to_string(), "no_show");
        assert_eq!("in_progress".parse::<super::BookingStatus>().unwrap(), InProgress);
    }
}
