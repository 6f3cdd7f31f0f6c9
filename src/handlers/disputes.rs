// src/handlers/disputes.rs
// DOCUMENTATION: HTTP handlers for rental disputes
// PURPOSE: Participants open and read disputes, admins close them

use crate::auth::{verify_admin_token, AuthenticatedUser};
use crate::config::Config;
use crate::errors::MarketplaceError;
use crate::models::{OpenDisputeRequest, ResolveDisputeRequest};
use crate::services::DisputeService;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /rentals/{id}/disputes
pub async fn open_dispute(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req: web::Json<OpenDisputeRequest>,
) -> Result<impl Responder, MarketplaceError> {
    req.validate()?;

    let dispute =
        DisputeService::open_dispute(pool.get_ref(), user.id, path.into_inner(), req.into_inner()).await?;
    log::info!("Dispute {} opened on rental {} by {}", dispute.id, dispute.rental_id, user.id);
    Ok(HttpResponse::Created().json(dispute))
}

/// GET /rentals/{id}/disputes
pub async fn list_disputes(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let disputes = DisputeService::list_disputes(pool.get_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(disputes))
}

/// POST /admin/disputes/{id}/resolve
/// Requires admin authentication via X-Admin-Token header
pub async fn resolve_dispute(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<ResolveDisputeRequest>,
) -> Result<impl Responder, MarketplaceError> {
    verify_admin_token(&req, &config)?;
    body.validate()?;

    let dispute = DisputeService::resolve_dispute(pool.get_ref(), path.into_inner(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(dispute))
}
