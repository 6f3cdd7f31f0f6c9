// src/db/stats_repository.rs
// DOCUMENTATION: Read-only queries backing the dashboards
// PURPOSE: Fetch raw rows; aggregation happens in StatsService

use crate::errors::MarketplaceError;
use crate::models::{ListingCounts, PlatformStats, RentalSummaryRow, StatusCount};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

pub struct StatsRepository;

fn stats_query_failed(what: &str, e: sqlx::Error) -> MarketplaceError {
    log::error!("Failed to load platform {}: {}", what, e);
    MarketplaceError::DatabaseError(e.to_string())
}

impl StatsRepository {
    /// Every rental the user takes part in, either side
    pub async fn rental_summaries(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<RentalSummaryRow>, MarketplaceError> {
        sqlx::query_as::<_, RentalSummaryRow>(
            r#"
            SELECT renter_id, owner_id, status, payment_status, subtotal, total_price
            FROM rentals
            WHERE renter_id = $1 OR owner_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to load rental summaries for {}: {}", user_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    pub async fn listing_counts(pool: &PgPool, owner_id: Uuid) -> Result<ListingCounts, MarketplaceError> {
        sqlx::query_as::<_, ListingCounts>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_available) AS available
            FROM gear
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to count listings for {}: {}", owner_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Platform-wide counters for the admin dashboard
    pub async fn platform_stats(pool: &PgPool) -> Result<PlatformStats, MarketplaceError> {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .map_err(|e| stats_query_failed("user count", e))?;

        let gear: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gear")
            .fetch_one(pool)
            .await
            .map_err(|e| stats_query_failed("gear count", e))?;

        let rentals_by_status: Vec<StatusCount> = sqlx::query_as(
            "SELECT status, COUNT(*) AS count FROM rentals GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await
        .map_err(|e| stats_query_failed("rental status counts", e))?;

        let gross_volume: Option<Decimal> = sqlx::query_scalar(
            "SELECT SUM(total_price) FROM rentals WHERE payment_status = 'paid'",
        )
        .fetch_one(pool)
        .await
        .map_err(|e| stats_query_failed("gross volume", e))?;

        let open_disputes: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM disputes WHERE status = 'open'")
                .fetch_one(pool)
                .await
                .map_err(|e| stats_query_failed("open dispute count", e))?;

        Ok(PlatformStats {
            users,
            gear,
            rentals_by_status,
            gross_volume: gross_volume.unwrap_or(Decimal::ZERO),
            open_disputes,
        })
    }
}
