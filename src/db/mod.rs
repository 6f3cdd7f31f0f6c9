// src/db/mod.rs
// DOCUMENTATION: Database module organization
// PURPOSE: Re-export database components

pub mod dispute_repository;
pub mod gear_repository;
pub mod message_repository;
pub mod rental_repository;
pub mod review_repository;
pub mod stats_repository;
pub mod user_repository;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use dispute_repository::*;
pub use gear_repository::*;
pub use message_repository::*;
pub use rental_repository::*;
pub use review_repository::*;
pub use stats_repository::*;
pub use user_repository::*;

use crate::errors::MarketplaceError;
use sqlx::{PgPool, Postgres, Transaction};

/// Start a transaction; repositories take `&mut *tx` as their connection
pub async fn begin_transaction(pool: &PgPool) -> Result<Transaction<'static, Postgres>, MarketplaceError> {
    pool.begin().await.map_err(|e| {
        log::error!("Failed to start transaction: {}", e);
        MarketplaceError::DatabaseError(e.to_string())
    })
}

pub async fn commit_transaction(tx: Transaction<'static, Postgres>) -> Result<(), MarketplaceError> {
    tx.commit().await.map_err(|e| {
        log::error!("Failed to commit transaction: {}", e);
        MarketplaceError::DatabaseError(e.to_string())
    })
}
