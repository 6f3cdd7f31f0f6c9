// src/services/user_service.rs

use crate::auth::AuthenticatedUser;
use crate::db::{ReviewRepository, UserRepository};
use crate::errors::MarketplaceError;
use crate::models::{PublicProfile, ReviewResponse, UpdateProfileRequest, User};
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserService;

impl UserService {
    /// Profile of the caller, created on first sight of a Supabase user
    pub async fn me(pool: &PgPool, user: &AuthenticatedUser) -> Result<User, MarketplaceError> {
        UserRepository::ensure_user(pool, user.id, &user.email).await
    }

    pub async fn update_me(
        pool: &PgPool,
        user: &AuthenticatedUser,
        req: UpdateProfileRequest,
    ) -> Result<User, MarketplaceError> {
        UserRepository::ensure_user(pool, user.id, &user.email).await?;
        UserRepository::update_profile(pool, user.id, &req).await
    }

    pub async fn public_profile(pool: &PgPool, id: Uuid) -> Result<PublicProfile, MarketplaceError> {
        Ok(UserRepository::get_by_id(pool, id).await?.to_public())
    }

    /// Reviews the user received, newest first
    pub async fn reviews_received(pool: &PgPool, id: Uuid) -> Result<Vec<ReviewResponse>, MarketplaceError> {
        UserRepository::get_by_id(pool, id).await?;
        ReviewRepository::get_reviews_for_user(pool, id).await
    }
}
