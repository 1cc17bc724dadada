use bson::oid::ObjectId;
use mongodb::Database;

use crate::repositories::{
    ProviderRepository, ProviderRepositoryImpl, RepositoryError, ReviewRepository,
    ReviewRepositoryImpl, SalonRepository, SalonRepositoryImpl,
};

/// Weighted popularity used as the default salon ordering. Ratings dominate,
/// bookings and favorites break ties between similarly rated salons.
pub fn popularity_score(average_rating: f64, bookings_count: i64, favorites_count: i64) -> f64 {
    average_rating * 20.0 + bookings_count as f64 * 2.0 + favorites_count as f64
}

/// Recomputes denormalized rating fields after a review lands or engagement
/// counters move. Reviews stay the single source of truth, salons and
/// providers only cache the aggregate.
pub struct RatingService {
    reviews: ReviewRepositoryImpl,
    salons: SalonRepositoryImpl,
    providers: ProviderRepositoryImpl,
}

impl RatingService {
    pub fn new(db: Database) -> Self {
        Self {
            reviews: ReviewRepositoryImpl::new(db.clone()),
            salons: SalonRepositoryImpl::new(db.clone()),
            providers: ProviderRepositoryImpl::new(db),
        }
    }

    pub async fn refresh_salon(&self, salon_id: ObjectId) -> Result<(), RepositoryError> {
        let stats = self.reviews.salon_rating_stats(salon_id).await?;
        let salon = self
            .salons
            .find_by_id(salon_id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("salon {salon_id}")))?;

        let score = popularity_score(stats.average, salon.bookings_count, salon.favorites_count);
        self.salons
            .set_rating_stats(salon_id, stats.average, stats.count, score)
            .await
    }

    pub async fn refresh_provider(&self, provider_id: ObjectId) -> Result<(), RepositoryError> {
        let stats = self.reviews.provider_rating_stats(provider_id).await?;
        self.providers
            .set_rating_stats(provider_id, stats.average, stats.count)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::popularity_score;

    #[test]
    fn ratings_weigh_heaviest() {
        let highly_rated = popularity_score(5.0, 10, 5);
        let heavily_booked = popularity_score(3.0, 25, 5);
        assert!(highly_rated > heavily_booked);
    }

    #[test]
    fn engagement_breaks_ties() {
        let quiet = popularity_score(4.5, 10, 2);
        let busy = popularity_score(4.5, 40, 30);
        assert!(busy > quiet);
    }

    #[test]
    fn fresh_salon_scores_zero() {
        assert_eq!(popularity_score(0.0, 0, 0), 0.0);
    }
}
