// src/db/rental_repository.rs
// DOCUMENTATION: Rental database operations
// PURPOSE: Booking inserts, overlap lookups, lifecycle and payment writes

use crate::errors::MarketplaceError;
use crate::models::{
    BookedRange, Gear, PaymentStatus, PriceQuote, Rental, RentalRole, RentalStatus,
};
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Fields needed to insert a rental; pricing is computed before the insert
pub struct NewRental<'a> {
    pub gear: &'a Gear,
    pub renter_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub quote: &'a PriceQuote,
    pub message: Option<&'a str>,
}

pub struct RentalRepository;

impl RentalRepository {
    /// Insert a pending rental inside the booking transaction
    pub async fn insert(conn: &mut PgConnection, new: &NewRental<'_>) -> Result<Rental, MarketplaceError> {
        sqlx::query_as::<_, Rental>(
            r#"
            INSERT INTO rentals (
                gear_id, renter_id, owner_id, start_date, end_date, status,
                subtotal, service_fee, total_price, security_deposit, message
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(new.gear.id)
        .bind(new.renter_id)
        .bind(new.gear.owner_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.quote.subtotal)
        .bind(new.quote.service_fee)
        .bind(new.quote.total)
        .bind(new.quote.security_deposit)
        .bind(new.message)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            log::error!("Failed to create rental for gear {}: {}", new.gear.id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Rental, MarketplaceError> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching rental {}: {}", id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| MarketplaceError::NotFound(format!("Rental {}", id)))
    }

    /// Lock a rental row for a status change
    pub async fn get_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Rental, MarketplaceError> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| {
                log::error!("Failed to lock rental {}: {}", id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| MarketplaceError::NotFound(format!("Rental {}", id)))
    }

    pub async fn get_by_payment_intent(
        pool: &PgPool,
        payment_intent_id: &str,
    ) -> Result<Option<Rental>, MarketplaceError> {
        sqlx::query_as::<_, Rental>("SELECT * FROM rentals WHERE payment_intent_id = $1")
            .bind(payment_intent_id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to fetch rental for intent {}: {}", payment_intent_id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })
    }

    /// Rentals where the user is renter or owner, newest first
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        role: RentalRole,
        status: Option<RentalStatus>,
    ) -> Result<Vec<Rental>, MarketplaceError> {
        let sql = match role {
            RentalRole::Renter => {
                r#"
                SELECT * FROM rentals
                WHERE renter_id = $1 AND ($2::rental_status IS NULL OR status = $2)
                ORDER BY created_at DESC
                "#
            }
            RentalRole::Owner => {
                r#"
                SELECT * FROM rentals
                WHERE owner_id = $1 AND ($2::rental_status IS NULL OR status = $2)
                ORDER BY created_at DESC
                "#
            }
        };

        sqlx::query_as::<_, Rental>(sql)
            .bind(user_id)
            .bind(status)
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list rentals for user {}: {}", user_id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })
    }

    /// Blocking rentals on a gear overlapping [start, end), optionally excluding one rental
    pub async fn overlapping(
        conn: &mut PgConnection,
        gear_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<BookedRange>, MarketplaceError> {
        sqlx::query_as::<_, BookedRange>(
            r#"
            SELECT start_date, end_date, status
            FROM rentals
            WHERE gear_id = $1
              AND status IN ('pending', 'approved', 'active')
              AND start_date < $3
              AND end_date > $2
              AND ($4::uuid IS NULL OR id <> $4)
            ORDER BY start_date
            "#,
        )
        .bind(gear_id)
        .bind(start)
        .bind(end)
        .bind(exclude)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            log::error!("Overlap lookup failed for gear {}: {}", gear_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Write a new lifecycle status
    pub async fn update_status(
        conn: &mut PgConnection,
        id: Uuid,
        status: RentalStatus,
        cancelled_by: Option<Uuid>,
    ) -> Result<Rental, MarketplaceError> {
        let rental = sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET status = $1,
                cancelled_by = COALESCE($2, cancelled_by),
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(cancelled_by)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            log::error!("Status update failed for rental {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| MarketplaceError::NotFound(format!("Rental {}", id)))?;

        log::info!("Rental {} is now {}", id, status);
        Ok(rental)
    }

    /// Attach a PaymentIntent and its current payment state
    pub async fn set_payment_intent(
        pool: &PgPool,
        id: Uuid,
        payment_intent_id: &str,
        payment_status: PaymentStatus,
    ) -> Result<Rental, MarketplaceError> {
        sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET payment_intent_id = $1,
                payment_status = $2,
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(payment_intent_id)
        .bind(payment_status)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to store payment intent for rental {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| MarketplaceError::NotFound(format!("Rental {}", id)))
    }

    pub async fn set_payment_status(
        conn: &mut PgConnection,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Rental, MarketplaceError> {
        sqlx::query_as::<_, Rental>(
            r#"
            UPDATE rentals
            SET payment_status = $1,
                updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(payment_status)
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(|e| {
            log::error!("Failed to update payment status for rental {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| MarketplaceError::NotFound(format!("Rental {}", id)))
    }

    /// Count rentals still holding the gear's calendar
    pub async fn count_blocking_for_gear(conn: &mut PgConnection, gear_id: Uuid) -> Result<i64, MarketplaceError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM rentals
            WHERE gear_id = $1 AND status IN ('pending', 'approved', 'active')
            "#,
        )
        .bind(gear_id)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            log::error!("Failed to count rentals for gear {}: {}", gear_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_fixtures::{day, insert_gear, insert_rental, insert_user};

    async fn overlaps(pool: &PgPool, gear_id: Uuid, start: i64, end: i64, exclude: Option<Uuid>) -> usize {
        let mut conn = pool.acquire().await.unwrap();
        RentalRepository::overlapping(&mut *conn, gear_id, day(start), day(end), exclude)
            .await
            .unwrap()
            .len()
    }

    #[sqlx::test]
    async fn test_overlapping_is_half_open_and_skips_terminal(pool: PgPool) {
        let owner = insert_user(&pool).await;
        let renter = insert_user(&pool).await;
        let gear = insert_gear(&pool, owner, "Canoe", "water", 40).await;
        let held = insert_rental(&pool, &gear, renter, day(10), day(13), RentalStatus::Pending).await;
        insert_rental(&pool, &gear, renter, day(20), day(25), RentalStatus::Cancelled).await;

        assert_eq!(overlaps(&pool, gear.id, 12, 14, None).await, 1);
        assert_eq!(overlaps(&pool, gear.id, 8, 20, None).await, 1);
        // Touching ranges share no day
        assert_eq!(overlaps(&pool, gear.id, 13, 15, None).await, 0);
        assert_eq!(overlaps(&pool, gear.id, 7, 10, None).await, 0);
        // Cancelled rentals free the calendar
        assert_eq!(overlaps(&pool, gear.id, 21, 22, None).await, 0);
        assert_eq!(overlaps(&pool, gear.id, 11, 12, Some(held.id)).await, 0);
    }

    #[sqlx::test]
    async fn test_count_blocking_for_gear(pool: PgPool) {
        let owner = insert_user(&pool).await;
        let renter = insert_user(&pool).await;
        let gear = insert_gear(&pool, owner, "Snowboard", "snow", 30).await;
        insert_rental(&pool, &gear, renter, day(1), day(3), RentalStatus::Active).await;
        insert_rental(&pool, &gear, renter, day(5), day(6), RentalStatus::Completed).await;
        insert_rental(&pool, &gear, renter, day(7), day(9), RentalStatus::Rejected).await;

        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(RentalRepository::count_blocking_for_gear(&mut *conn, gear.id).await.unwrap(), 1);
    }
}
