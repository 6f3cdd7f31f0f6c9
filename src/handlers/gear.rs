// src/handlers/gear.rs
// DOCUMENTATION: HTTP handlers for gear listings
// PURPOSE: Parse requests, call services, return responses

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::MarketplaceError;
use crate::models::{AvailabilityQuery, CreateGearRequest, GearSearchQuery, UpdateGearRequest};
use crate::services::{GearService, RateLimiters, ResponseCache};
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ReviewListQuery {
    pub limit: Option<i64>,
}

/// POST /gear
/// Create a new listing owned by the caller
pub async fn create_gear(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    limiters: web::Data<Arc<RateLimiters>>,
    user: AuthenticatedUser,
    req: web::Json<CreateGearRequest>,
) -> Result<impl Responder, MarketplaceError> {
    limiters.check_write(user.id)?;
    req.validate()?;

    UserRepository::ensure_user(pool.get_ref(), user.id, &user.email).await?;
    let gear = GearService::create_gear(pool.get_ref(), cache.get_ref(), user.id, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(gear))
}

/// GET /gear
/// Search listings with filters and pagination
pub async fn search_gear(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    query: web::Query<GearSearchQuery>,
) -> Result<impl Responder, MarketplaceError> {
    let result = GearService::search_gear(pool.get_ref(), cache.get_ref(), query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /gear/{id}
pub async fn get_gear(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let detail = GearService::get_gear_detail(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// PUT /gear/{id}
/// Owner-only partial update
pub async fn update_gear(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req: web::Json<UpdateGearRequest>,
) -> Result<impl Responder, MarketplaceError> {
    req.validate()?;

    let gear = GearService::update_gear(
        pool.get_ref(),
        cache.get_ref(),
        user.id,
        path.into_inner(),
        req.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(gear))
}

/// DELETE /gear/{id}
pub async fn delete_gear(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    GearService::delete_gear(pool.get_ref(), cache.get_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /gear/{id}/availability?start_date=..&end_date=..
pub async fn check_availability(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    path: web::Path<Uuid>,
    query: web::Query<AvailabilityQuery>,
) -> Result<impl Responder, MarketplaceError> {
    let result = GearService::check_availability(
        pool.get_ref(),
        config.get_ref(),
        path.into_inner(),
        query.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(result))
}

/// GET /gear/{id}/booked-dates
pub async fn booked_dates(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let ranges = GearService::booked_dates(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ranges))
}

/// GET /gear/{id}/reviews
pub async fn gear_reviews(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    query: web::Query<ReviewListQuery>,
) -> Result<impl Responder, MarketplaceError> {
    let reviews = GearService::gear_reviews(pool.get_ref(), path.into_inner(), query.limit).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/gear")
            .route("", web::post().to(create_gear))
            .route("", web::get().to(search_gear))
            .route("/{id}", web::get().to(get_gear))
            .route("/{id}", web::put().to(update_gear))
            .route("/{id}", web::delete().to(delete_gear))
            .route("/{id}/availability", web::get().to(check_availability))
            .route("/{id}/booked-dates", web::get().to(booked_dates))
            .route("/{id}/reviews", web::get().to(gear_reviews)),
    );
}
