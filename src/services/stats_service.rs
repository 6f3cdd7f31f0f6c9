// src/services/stats_service.rs
// DOCUMENTATION: Dashboard statistics
// PURPOSE: Aggregate the caller's rentals in memory; cache the result per user

use crate::db::{MessageRepository, StatsRepository, UserRepository};
use crate::errors::MarketplaceError;
use crate::models::{
    DashboardStats, ListingCounts, PaymentStatus, PlatformStats, RentalStatus, RentalSummaryRow,
    User,
};
use crate::services::cache::ResponseCache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Fold summary rows into the caller's dashboard
pub fn aggregate(
    user_id: Uuid,
    rows: &[RentalSummaryRow],
    listings: &ListingCounts,
    unread_messages: i64,
    user: Option<&User>,
) -> DashboardStats {
    let mut stats = DashboardStats {
        listings: listings.total,
        available_listings: listings.available,
        unread_messages,
        rating_average: user.and_then(|u| u.rating_average),
        rating_count: user.map(|u| u.rating_count).unwrap_or(0),
        ..Default::default()
    };

    for row in rows {
        let paid = row.payment_status == PaymentStatus::Paid;

        if row.owner_id == user_id {
            *stats.owner_rentals.entry(row.status.to_string()).or_insert(0) += 1;

            if row.status == RentalStatus::Pending {
                stats.pending_requests += 1;
            }
            if paid && matches!(row.status, RentalStatus::Active | RentalStatus::Completed) {
                stats.total_earnings += row.subtotal;
            }
        }

        if row.renter_id == user_id {
            *stats.renter_rentals.entry(row.status.to_string()).or_insert(0) += 1;

            if paid {
                stats.total_spent += row.total_price;
            }
        }

        if row.status == RentalStatus::Active {
            stats.active_rentals += 1;
        }
    }

    stats.total_earnings = stats.total_earnings.round_dp(2);
    stats.total_spent = stats.total_spent.round_dp(2);
    stats
}

pub struct StatsService;

impl StatsService {
    pub async fn dashboard(
        pool: &PgPool,
        cache: &ResponseCache,
        user_id: Uuid,
    ) -> Result<DashboardStats, MarketplaceError> {
        let cache_key = ResponseCache::dashboard_key(user_id);
        if let Some(cached) = cache.get(&cache_key).await {
            if let Ok(stats) = serde_json::from_str::<DashboardStats>(&cached) {
                return Ok(stats);
            }
        }

        let user = match UserRepository::get_by_id(pool, user_id).await {
            Ok(user) => Some(user),
            Err(MarketplaceError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let rows = StatsRepository::rental_summaries(pool, user_id).await?;
        let listings = StatsRepository::listing_counts(pool, user_id).await?;
        let unread = MessageRepository::count_unread(pool, user_id).await?;

        let stats = aggregate(user_id, &rows, &listings, unread, user.as_ref());

        match serde_json::to_string(&stats) {
            Ok(json) => cache.set(cache_key, json).await,
            Err(e) => log::warn!("Failed to cache dashboard for {}: {}", user_id, e),
        }

        Ok(stats)
    }

    pub async fn platform(pool: &PgPool) -> Result<PlatformStats, MarketplaceError> {
        StatsRepository::platform_stats(pool).await
    }
}
