// src/handlers/users.rs
// DOCUMENTATION: HTTP handlers for user profiles
// PURPOSE: Own profile (created from the session on first call) and public profiles

use crate::auth::AuthenticatedUser;
use crate::errors::MarketplaceError;
use crate::models::UpdateProfileRequest;
use crate::services::UserService;
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// GET /users/me
pub async fn get_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<impl Responder, MarketplaceError> {
    let profile = UserService::me(pool.get_ref(), &user).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// PUT /users/me
pub async fn update_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, MarketplaceError> {
    req.validate()?;

    let profile = UserService::update_me(pool.get_ref(), &user, req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /users/{id}
pub async fn get_profile(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let profile = UserService::public_profile(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

/// GET /users/{id}/reviews
pub async fn get_user_reviews(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, MarketplaceError> {
    let reviews = UserService::reviews_received(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(reviews))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("/me", web::get().to(get_me))
            .route("/me", web::put().to(update_me))
            .route("/{id}", web::get().to(get_profile))
            .route("/{id}/reviews", web::get().to(get_user_reviews)),
    );
}
