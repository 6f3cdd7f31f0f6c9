// src/db/user_repository.rs
// DOCUMENTATION: User profile database operations
// PURPOSE: Profiles mirror Supabase auth users and carry rating aggregates

use crate::errors::MarketplaceError;
use crate::models::{UpdateProfileRequest, User};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct UserRepository;

impl UserRepository {
    /// Create the profile row for an authenticated user if missing
    /// DOCUMENTATION: Keeps the email in sync with the latest JWT claims
    pub async fn ensure_user(pool: &PgPool, id: Uuid, email: &str) -> Result<User, MarketplaceError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET email = EXCLUDED.email
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to ensure user {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User, MarketplaceError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching user {}: {}", id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| MarketplaceError::NotFound(format!("User {}", id)))
    }

    /// Partial update - only provided fields are modified
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateProfileRequest,
    ) -> Result<User, MarketplaceError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name),
                avatar_url = COALESCE($2, avatar_url),
                bio = COALESCE($3, bio),
                location = COALESCE($4, location),
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
        )
        .bind(&req.full_name)
        .bind(&req.avatar_url)
        .bind(&req.bio)
        .bind(&req.location)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Profile update failed for user {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| MarketplaceError::NotFound(format!("User {}", id)))
    }

    /// Recompute rating aggregates from received reviews
    pub async fn recompute_rating(conn: &mut PgConnection, id: Uuid) -> Result<(), MarketplaceError> {
        sqlx::query(
            r#"
            UPDATE users u
            SET rating_average = s.avg_rating,
                rating_count = s.review_count,
                updated_at = NOW()
            FROM (
                SELECT ROUND(AVG(rating)::numeric, 2) AS avg_rating,
                       COUNT(*)::int AS review_count
                FROM reviews
                WHERE reviewee_id = $1
            ) s
            WHERE u.id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            log::error!("Failed to recompute rating for user {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}
