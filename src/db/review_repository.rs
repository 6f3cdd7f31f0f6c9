// src/db/review_repository.rs
// DOCUMENTATION: Review database operations
// PURPOSE: Insert at most one review per rental, list by gear or user

use crate::errors::MarketplaceError;
use crate::models::{CreateReviewRequest, Rental, Review, ReviewResponse};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct ReviewRepository;

impl ReviewRepository {
    /// Create a new review
    /// DOCUMENTATION: The unique constraint on rental_id allows one review per rental
    pub async fn create_review(
        conn: &mut PgConnection,
        rental: &Rental,
        reviewer_id: Uuid,
        reviewee_id: Uuid,
        req: &CreateReviewRequest,
    ) -> Result<Review, MarketplaceError> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (rental_id, gear_id, reviewer_id, reviewee_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(rental.id)
        .bind(rental.gear_id)
        .bind(reviewer_id)
        .bind(reviewee_id)
        .bind(req.rating)
        .bind(&req.comment)
        .fetch_one(conn)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                log::warn!("Rental {} already reviewed; rejecting review by {}", rental.id, reviewer_id);
                MarketplaceError::AlreadyExists(format!("Review for rental {}", rental.id))
            }
            other => {
                log::error!("Failed to create review: {}", other);
                MarketplaceError::DatabaseError(format!("Create review failed: {}", other))
            }
        })
    }

    /// Reviews written by renters about a listing
    pub async fn get_reviews_by_gear(
        pool: &PgPool,
        gear_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ReviewResponse>, MarketplaceError> {
        sqlx::query_as::<_, ReviewResponse>(
            r#"
            SELECT r.id, r.rental_id, r.gear_id, r.reviewer_id,
                   u.full_name AS reviewer_name,
                   r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN rentals rt ON rt.id = r.rental_id
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.gear_id = $1 AND r.reviewer_id = rt.renter_id
            ORDER BY r.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(gear_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews for gear {}: {}", gear_id, e);
            MarketplaceError::DatabaseError(format!("Fetch reviews failed: {}", e))
        })
    }

    /// Reviews received by a user
    pub async fn get_reviews_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<ReviewResponse>, MarketplaceError> {
        sqlx::query_as::<_, ReviewResponse>(
            r#"
            SELECT r.id, r.rental_id, r.gear_id, r.reviewer_id,
                   u.full_name AS reviewer_name,
                   r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.reviewer_id
            WHERE r.reviewee_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch reviews for user {}: {}", user_id, e);
            MarketplaceError::DatabaseError(format!("Fetch reviews failed: {}", e))
        })
    }
}
