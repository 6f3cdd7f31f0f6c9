// src/handlers/reviews.rs

use crate::auth::AuthenticatedUser;
use crate::errors::MarketplaceError;
use crate::models::CreateReviewRequest;
use crate::services::{ResponseCache, ReviewService};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// POST /reviews
/// Review the other side of a completed rental
pub async fn create_review(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
    req: web::Json<CreateReviewRequest>,
) -> Result<impl Responder, MarketplaceError> {
    req.validate()?;

    let review = ReviewService::create_review(pool.get_ref(), cache.get_ref(), user.id, req.into_inner()).await?;
    Ok(HttpResponse::Created().json(review))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/reviews", web::post().to(create_review));
}
