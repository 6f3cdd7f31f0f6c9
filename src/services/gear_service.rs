// src/services/gear_service.rs
// DOCUMENTATION: Business logic for gear listings
// PURPOSE: Ownership checks, cached search, availability and quotes

use crate::config::Config;
use crate::db::{
    begin_transaction, commit_transaction, GearRepository, RentalRepository, ReviewRepository,
    UserRepository,
};
use crate::errors::MarketplaceError;
use crate::models::{
    AvailabilityQuery, AvailabilityResponse, BookedRange, CreateGearRequest, Gear,
    GearDetailResponse, GearSearchQuery, GearSearchResponse, ReviewResponse, UpdateGearRequest,
};
use crate::services::availability::{find_conflicts, validate_range};
use crate::services::cache::ResponseCache;
use crate::services::pricing::{calculate_price, GearRates};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Namespace of cached search responses
pub const SEARCH_CACHE_PREFIX: &str = "gear:search:";

/// Reviews embedded in the listing detail
const DETAIL_REVIEW_LIMIT: i64 = 10;

pub struct GearService;

impl GearService {
    pub async fn create_gear(
        pool: &PgPool,
        cache: &ResponseCache,
        owner_id: Uuid,
        req: CreateGearRequest,
    ) -> Result<Gear, MarketplaceError> {
        let gear = GearRepository::create_gear(pool, owner_id, &req).await?;
        cache.invalidate_prefix(SEARCH_CACHE_PREFIX).await;
        cache.invalidate(&ResponseCache::dashboard_key(owner_id)).await;
        Ok(gear)
    }

    /// Search listings, served from cache when the same query was seen recently
    pub async fn search_gear(
        pool: &PgPool,
        cache: &ResponseCache,
        query: GearSearchQuery,
    ) -> Result<GearSearchResponse, MarketplaceError> {
        query.check()?;

        let cache_key = query.cache_key();
        if let Some(cached) = cache.get(&cache_key).await {
            match serde_json::from_str::<GearSearchResponse>(&cached) {
                Ok(response) => return Ok(response),
                Err(e) => log::warn!("Discarding unreadable cache entry {}: {}", cache_key, e),
            }
        }

        let (data, total_count) = GearRepository::search(pool, &query).await?;
        let has_more = query.offset() + (data.len() as i64) < total_count;

        let response = GearSearchResponse {
            data,
            total_count,
            page: query.page(),
            limit: query.limit(),
            has_more,
        };

        match serde_json::to_string(&response) {
            Ok(json) => cache.set(cache_key, json).await,
            Err(e) => log::warn!("Failed to serialize search response for cache: {}", e),
        }

        Ok(response)
    }

    /// Listing with owner summary and recent renter reviews
    pub async fn get_gear_detail(pool: &PgPool, id: Uuid) -> Result<GearDetailResponse, MarketplaceError> {
        let gear = GearRepository::get_by_id(pool, id).await?;
        let owner = UserRepository::get_by_id(pool, gear.owner_id).await?;
        let reviews = ReviewRepository::get_reviews_by_gear(pool, id, DETAIL_REVIEW_LIMIT).await?;

        Ok(GearDetailResponse {
            gear,
            owner: owner.to_public(),
            reviews,
        })
    }

    async fn get_owned(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Gear, MarketplaceError> {
        let gear = GearRepository::get_by_id(pool, id).await?;
        if gear.owner_id != user_id {
            log::warn!("User {} tried to modify gear {} owned by {}", user_id, id, gear.owner_id);
            return Err(MarketplaceError::Forbidden);
        }
        Ok(gear)
    }

    pub async fn update_gear(
        pool: &PgPool,
        cache: &ResponseCache,
        user_id: Uuid,
        id: Uuid,
        req: UpdateGearRequest,
    ) -> Result<Gear, MarketplaceError> {
        Self::get_owned(pool, id, user_id).await?;
        let gear = GearRepository::update_gear(pool, id, &req).await?;
        cache.invalidate_prefix(SEARCH_CACHE_PREFIX).await;
        cache.invalidate(&ResponseCache::dashboard_key(user_id)).await;
        Ok(gear)
    }

    /// Delete a listing unless a rental still holds its calendar
    /// DOCUMENTATION: The gear row lock is the one bookings take, so no rental
    /// can appear between the count and the delete
    pub async fn delete_gear(
        pool: &PgPool,
        cache: &ResponseCache,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<(), MarketplaceError> {
        let mut tx = begin_transaction(pool).await?;

        let gear = GearRepository::get_for_update(&mut *tx, id).await?;
        if gear.owner_id != user_id {
            log::warn!("User {} tried to delete gear {} owned by {}", user_id, id, gear.owner_id);
            return Err(MarketplaceError::Forbidden);
        }

        let open_rentals = RentalRepository::count_blocking_for_gear(&mut *tx, id).await?;
        if open_rentals > 0 {
            return Err(MarketplaceError::Conflict(format!(
                "Gear has {} open rental(s) and cannot be deleted",
                open_rentals
            )));
        }

        GearRepository::delete_gear(&mut *tx, id).await?;
        commit_transaction(tx).await?;

        cache.invalidate_prefix(SEARCH_CACHE_PREFIX).await;
        cache.invalidate(&ResponseCache::dashboard_key(user_id)).await;
        Ok(())
    }

    /// Availability and price quote for a prospective booking
    pub async fn check_availability(
        pool: &PgPool,
        config: &Config,
        id: Uuid,
        query: AvailabilityQuery,
    ) -> Result<AvailabilityResponse, MarketplaceError> {
        let days = validate_range(query.start_date, query.end_date, Utc::now().date_naive())?;
        let gear = GearRepository::get_by_id(pool, id).await?;

        let booked = GearRepository::booked_ranges(pool, id, query.start_date).await?;
        let conflicts = find_conflicts(query.start_date, query.end_date, &booked);
        let quote = calculate_price(&GearRates::from(&gear), days, config.service_fee_percent)?;

        Ok(AvailabilityResponse {
            gear_id: id,
            start_date: query.start_date,
            end_date: query.end_date,
            available: gear.is_available && conflicts.is_empty(),
            conflicts,
            quote,
        })
    }

    /// Ranges held by open rentals from today on
    pub async fn booked_dates(pool: &PgPool, id: Uuid) -> Result<Vec<BookedRange>, MarketplaceError> {
        GearRepository::get_by_id(pool, id).await?;
        GearRepository::booked_ranges(pool, id, Utc::now().date_naive()).await
    }

    pub async fn gear_reviews(
        pool: &PgPool,
        id: Uuid,
        limit: Option<i64>,
    ) -> Result<Vec<ReviewResponse>, MarketplaceError> {
        GearRepository::get_by_id(pool, id).await?;
        let limit = limit.unwrap_or(50).clamp(1, 200);
        ReviewRepository::get_reviews_by_gear(pool, id, limit).await
    }
}
