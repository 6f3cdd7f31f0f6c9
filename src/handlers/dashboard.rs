// src/handlers/dashboard.rs

use crate::auth::AuthenticatedUser;
use crate::errors::MarketplaceError;
use crate::services::{ResponseCache, StatsService};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use std::sync::Arc;

/// GET /dashboard/stats
/// Caller's listings, rentals on both sides, earnings and unread messages
pub async fn dashboard_stats(
    pool: web::Data<PgPool>,
    cache: web::Data<Arc<ResponseCache>>,
    user: AuthenticatedUser,
) -> Result<impl Responder, MarketplaceError> {
    let stats = StatsService::dashboard(pool.get_ref(), cache.get_ref(), user.id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard/stats", web::get().to(dashboard_stats));
}
