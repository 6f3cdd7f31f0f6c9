// src/db/gear_repository.rs
// DOCUMENTATION: Database access layer for gear listings
// PURPOSE: Listing CRUD, filtered search and calendar lookups

use crate::errors::MarketplaceError;
use crate::models::*;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// GearRepository: All database operations for gear
/// DOCUMENTATION: Dynamic search uses QueryBuilder so every filter is a bind parameter
pub struct GearRepository;

/// `%text%` pattern for ILIKE with the wildcard characters of `text` escaped
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Appends the WHERE clause shared by the search and count queries
fn push_search_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &GearSearchQuery) {
    qb.push(" WHERE 1 = 1");

    // Unlisted gear is only shown on the owner's own listing page
    match query.owner_id {
        Some(owner_id) => {
            qb.push(" AND g.owner_id = ").push_bind(owner_id);
        }
        None => {
            qb.push(" AND g.is_available = true");
        }
    }

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = contains_pattern(q);
        qb.push(" AND (g.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR g.description ILIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    if let Some(category) = &query.category {
        qb.push(" AND g.category = ").push_bind(category.clone());
    }

    if let Some(location) = &query.location {
        qb.push(" AND g.location ILIKE ")
            .push_bind(contains_pattern(location))
            .push(" ESCAPE '\\'");
    }

    if let Some(min_price) = query.min_price {
        qb.push(" AND g.daily_rate >= ").push_bind(min_price);
    }

    if let Some(max_price) = query.max_price {
        qb.push(" AND g.daily_rate <= ").push_bind(max_price);
    }

    // Date-range availability: no blocking rental may overlap [start, end)
    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        qb.push(
            " AND NOT EXISTS (SELECT 1 FROM rentals r WHERE r.gear_id = g.id \
             AND r.status IN ('pending', 'approved', 'active') AND r.start_date < ",
        )
        .push_bind(end)
        .push(" AND r.end_date > ")
        .push_bind(start)
        .push(")");
    }
}

impl GearRepository {
    /// Create new listing
    /// DOCUMENTATION: Used by POST /gear endpoint
    pub async fn create_gear(
        pool: &PgPool,
        owner_id: Uuid,
        req: &CreateGearRequest,
    ) -> Result<Gear, MarketplaceError> {
        let gear = sqlx::query_as::<_, Gear>(
            r#"
            INSERT INTO gear (
                owner_id, title, description, category, brand, model,
                condition, location, daily_rate, weekly_rate, monthly_rate,
                security_deposit, images
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(owner_id) // $1
        .bind(&req.title) // $2
        .bind(&req.description) // $3
        .bind(&req.category) // $4
        .bind(&req.brand) // $5
        .bind(&req.model) // $6
        .bind(&req.condition) // $7
        .bind(&req.location) // $8
        .bind(req.daily_rate) // $9
        .bind(req.weekly_rate) // $10
        .bind(req.monthly_rate) // $11
        .bind(req.security_deposit) // $12
        .bind(&req.images) // $13
        .fetch_one(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create gear: {}", e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        log::info!("Created gear {} for owner {}", gear.id, owner_id);
        Ok(gear)
    }

    /// Retrieve listing by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Gear, MarketplaceError> {
        sqlx::query_as::<_, Gear>("SELECT * FROM gear WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching gear: {}", e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| {
                log::warn!("Gear not found: {}", id);
                MarketplaceError::NotFound(format!("Gear {}", id))
            })
    }

    /// Lock the listing row for the rest of the transaction
    /// DOCUMENTATION: Serializes concurrent booking attempts on the same gear
    pub async fn get_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Gear, MarketplaceError> {
        sqlx::query_as::<_, Gear>("SELECT * FROM gear WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(|e| {
                log::error!("Failed to lock gear {}: {}", id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .ok_or_else(|| MarketplaceError::NotFound(format!("Gear {}", id)))
    }

    /// Search listings with filters
    /// DOCUMENTATION: Used for GET /gear endpoint
    /// Returns tuple: (results, total_count) for pagination
    pub async fn search(
        pool: &PgPool,
        query: &GearSearchQuery,
    ) -> Result<(Vec<Gear>, i64), MarketplaceError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM gear g");
        push_search_filters(&mut count_qb, query);

        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(pool)
            .await
            .map_err(|e| {
                log::error!("Count query error: {}", e);
                MarketplaceError::DatabaseError(e.to_string())
            })?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT g.* FROM gear g");
        push_search_filters(&mut qb, query);
        qb.push(" ORDER BY ")
            .push(query.sort.unwrap_or_default().order_clause())
            .push(" LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        log::debug!("Executing gear search: {}", qb.sql());

        let gear = qb
            .build_query_as::<Gear>()
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Search query error: {}", e);
                MarketplaceError::DatabaseError(e.to_string())
            })?;

        log::info!(
            "Gear search completed: {} results, {} total (page {})",
            gear.len(),
            total,
            query.page()
        );

        Ok((gear, total))
    }

    /// Update existing listing
    /// DOCUMENTATION: Partial update - only provided fields are modified
    pub async fn update_gear(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateGearRequest,
    ) -> Result<Gear, MarketplaceError> {
        let gear = sqlx::query_as::<_, Gear>(
            r#"
            UPDATE gear
            SET title = COALESCE($1, title),
                description = COALESCE($2, description),
                category = COALESCE($3, category),
                brand = COALESCE($4, brand),
                model = COALESCE($5, model),
                condition = COALESCE($6, condition),
                location = COALESCE($7, location),
                daily_rate = COALESCE($8, daily_rate),
                weekly_rate = COALESCE($9, weekly_rate),
                monthly_rate = COALESCE($10, monthly_rate),
                security_deposit = COALESCE($11, security_deposit),
                images = COALESCE($12, images),
                is_available = COALESCE($13, is_available),
                updated_at = NOW()
            WHERE id = $14
            RETURNING *
            "#,
        )
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.category)
        .bind(&req.brand)
        .bind(&req.model)
        .bind(&req.condition)
        .bind(&req.location)
        .bind(req.daily_rate)
        .bind(req.weekly_rate)
        .bind(req.monthly_rate)
        .bind(req.security_deposit)
        .bind(&req.images)
        .bind(req.is_available)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Update failed for gear {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?
        .ok_or_else(|| MarketplaceError::NotFound(format!("Gear {}", id)))?;

        log::info!("Updated gear: {}", id);
        Ok(gear)
    }

    pub async fn delete_gear(conn: &mut PgConnection, id: Uuid) -> Result<(), MarketplaceError> {
        let rows = sqlx::query("DELETE FROM gear WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await
            .map_err(|e| {
                log::error!("Delete failed for gear {}: {}", id, e);
                MarketplaceError::DatabaseError(e.to_string())
            })?
            .rows_affected();

        if rows == 0 {
            return Err(MarketplaceError::NotFound(format!("Gear {}", id)));
        }

        log::info!("Deleted gear: {}", id);
        Ok(())
    }

    /// Blocking ranges ending after `from`, for calendars
    pub async fn booked_ranges(
        pool: &PgPool,
        gear_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<BookedRange>, MarketplaceError> {
        sqlx::query_as::<_, BookedRange>(
            r#"
            SELECT start_date, end_date, status
            FROM rentals
            WHERE gear_id = $1
              AND status IN ('pending', 'approved', 'active')
              AND end_date > $2
            ORDER BY start_date
            "#,
        )
        .bind(gear_id)
        .bind(from)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to fetch booked ranges for gear {}: {}", gear_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Recompute gear rating from reviews written by renters
    pub async fn recompute_rating(conn: &mut PgConnection, id: Uuid) -> Result<(), MarketplaceError> {
        sqlx::query(
            r#"
            UPDATE gear g
            SET rating_average = s.avg_rating,
                rating_count = s.review_count
            FROM (
                SELECT ROUND(AVG(r.rating)::numeric, 2) AS avg_rating,
                       COUNT(*)::int AS review_count
                FROM reviews r
                JOIN rentals rt ON rt.id = r.rental_id
                WHERE r.gear_id = $1 AND r.reviewer_id = rt.renter_id
            ) s
            WHERE g.id = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await
        .map_err(|e| {
            log::error!("Failed to recompute rating for gear {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        Ok(())
    }
}
