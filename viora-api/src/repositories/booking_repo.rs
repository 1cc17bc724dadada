use std::future::IntoFuture;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures_util::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use crate::domain::{Booking, BookingStatus};
use crate::search::PageRequest;

use super::repo_error::RepositoryError;

pub(crate) const COLLECTION: &str = "bookings";

#[async_trait]
pub trait BookingRepository {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Booking>, RepositoryError>;
    async fn list_for_customer(
        &self,
        customer_id: ObjectId,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), RepositoryError>;
    async fn list_for_salon(
        &self,
        salon_id: ObjectId,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), RepositoryError>;
    /// Atomically moves the booking from `from` to `to`. Returns `None` when
    /// the booking no longer sits in `from`, so racing writers cannot both
    /// win.
    async fn transition(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Option<Booking>, RepositoryError>;
}

#[derive(Clone)]
pub struct BookingRepositoryImpl {
    bookings: Collection<Booking>,
}

impl BookingRepositoryImpl {
    pub fn new(db: Database) -> Self {
        Self {
            bookings: db.collection(COLLECTION),
        }
    }

    async fn list_paged(
        &self,
        mut filter: bson::Document,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), RepositoryError> {
        if let Some(status) = status {
            filter.insert("status", status.to_string());
        }

        let find = self
            .bookings
            .find(filter.clone())
            .sort(doc! { "createdAt": -1 })
            .skip(page.skip())
            .limit(page.limit);
        let count = self.bookings.count_documents(filter);
        let (cursor, total) = tokio::try_join!(find.into_future(), count)?;

        let bookings = cursor.try_collect().await?;
        Ok((bookings, total))
    }
}

#[async_trait]
impl BookingRepository for BookingRepositoryImpl {
    async fn insert(&self, booking: &Booking) -> Result<(), RepositoryError> {
        self.bookings.insert_one(booking).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Booking>, RepositoryError> {
        let booking = self.bookings.find_one(doc! { "_id": id }).await?;
        Ok(booking)
    }

    async fn list_for_customer(
        &self,
        customer_id: ObjectId,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), RepositoryError> {
        self.list_paged(doc! { "customerId": customer_id }, status, page)
            .await
    }

    async fn list_for_salon(
        &self,
        salon_id: ObjectId,
        status: Option<BookingStatus>,
        page: &PageRequest,
    ) -> Result<(Vec<Booking>, u64), RepositoryError> {
        self.list_paged(doc! { "salonId": salon_id }, status, page)
            .await
    }

    async fn transition(
        &self,
        id: ObjectId,
        from: BookingStatus,
        to: BookingStatus,
        cancellation_reason: Option<&str>,
    ) -> Result<Option<Booking>, RepositoryError> {
        let mut set = doc! { "status": to.to_string() };
        if let Some(reason) = cancellation_reason {
            set.insert("cancellationReason", reason);
        }
        let update = doc! {
            "$set": set,
            "$currentDate": { "updatedAt": true },
        };

        let booking = self
            .bookings
            .find_one_and_update(doc! { "_id": id, "status": from.to_string() }, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(booking)
    }
}
