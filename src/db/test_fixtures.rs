// src/db/test_fixtures.rs
// DOCUMENTATION: Row builders for database-backed tests

use crate::db::{GearRepository, UserRepository};
use crate::models::{CreateGearRequest, Gear, Rental, RentalStatus};
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// `days` days from today
pub fn day(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

pub async fn insert_user(pool: &PgPool) -> Uuid {
    let id = Uuid::new_v4();
    UserRepository::ensure_user(pool, id, &format!("{}@example.com", id))
        .await
        .unwrap();
    id
}

pub fn gear_request(title: &str, category: &str, daily_rate: i64) -> CreateGearRequest {
    CreateGearRequest {
        title: title.to_string(),
        description: None,
        category: category.to_string(),
        brand: None,
        model: None,
        condition: None,
        location: Some("Portland".to_string()),
        daily_rate: Decimal::from(daily_rate),
        weekly_rate: None,
        monthly_rate: None,
        security_deposit: None,
        images: vec![],
    }
}

pub async fn insert_gear(pool: &PgPool, owner_id: Uuid, title: &str, category: &str, daily_rate: i64) -> Gear {
    GearRepository::create_gear(pool, owner_id, &gear_request(title, category, daily_rate))
        .await
        .unwrap()
}

/// Rental row in any status, bypassing the booking checks
pub async fn insert_rental(
    pool: &PgPool,
    gear: &Gear,
    renter_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    status: RentalStatus,
) -> Rental {
    let days = (end - start).num_days();
    let subtotal = gear.daily_rate * Decimal::from(days);

    sqlx::query_as::<_, Rental>(
        r#"
        INSERT INTO rentals (
            gear_id, renter_id, owner_id, start_date, end_date, status,
            subtotal, service_fee, total_price
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $7)
        RETURNING *
        "#,
    )
    .bind(gear.id)
    .bind(renter_id)
    .bind(gear.owner_id)
    .bind(start)
    .bind(end)
    .bind(status)
    .bind(subtotal)
    .fetch_one(pool)
    .await
    .unwrap()
}
