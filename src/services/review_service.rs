// src/services/review_service.rs
// DOCUMENTATION: Reviews after completed rentals
// PURPOSE: One review per rental, rating aggregates kept in sync

use crate::db::{begin_transaction, commit_transaction, GearRepository, RentalRepository, ReviewRepository, UserRepository};
use crate::errors::MarketplaceError;
use crate::models::{CreateReviewRequest, Rental, RentalStatus, Review};
use crate::services::cache::ResponseCache;
use crate::services::gear_service::SEARCH_CACHE_PREFIX;
use sqlx::PgPool;
use uuid::Uuid;

/// Who the reviewer is reviewing, if they may review this rental at all
pub fn reviewee_for(rental: &Rental, reviewer_id: Uuid) -> Result<Uuid, MarketplaceError> {
    let reviewee = rental.counterparty(reviewer_id).ok_or(MarketplaceError::Forbidden)?;

    if rental.status != RentalStatus::Completed {
        return Err(MarketplaceError::InvalidInput(
            "Only completed rentals can be reviewed".to_string(),
        ));
    }

    Ok(reviewee)
}

pub struct ReviewService;

impl ReviewService {
    pub async fn create_review(
        pool: &PgPool,
        cache: &ResponseCache,
        reviewer_id: Uuid,
        req: CreateReviewRequest,
    ) -> Result<Review, MarketplaceError> {
        let rental = RentalRepository::get_by_id(pool, req.rental_id).await?;
        let reviewee_id = reviewee_for(&rental, reviewer_id)?;

        let mut tx = begin_transaction(pool).await?;
        let review =
            ReviewRepository::create_review(&mut *tx, &rental, reviewer_id, reviewee_id, &req).await?;

        UserRepository::recompute_rating(&mut *tx, reviewee_id).await?;
        // Listing ratings only count what renters said about the gear
        if reviewer_id == rental.renter_id {
            GearRepository::recompute_rating(&mut *tx, rental.gear_id).await?;
        }
        commit_transaction(tx).await?;

        log::info!(
            "Review {} ({} stars) on rental {} by {}",
            review.id,
            review.rating,
            rental.id,
            reviewer_id
        );

        cache.invalidate(&ResponseCache::dashboard_key(reviewee_id)).await;
        if reviewer_id == rental.renter_id {
            cache.invalidate_prefix(SEARCH_CACHE_PREFIX).await;
        }

        Ok(review)
    }
}
