// src/db/dispute_repository.rs

use crate::errors::MarketplaceError;
use crate::models::{Dispute, OpenDisputeRequest, ResolveDisputeRequest};
use sqlx::PgPool;
use uuid::Uuid;

pub struct DisputeRepository;

impl DisputeRepository {
    /// Open a dispute; a partial unique index allows one open dispute per rental
    pub async fn create_dispute(
        pool: &PgPool,
        rental_id: Uuid,
        opened_by: Uuid,
        req: &OpenDisputeRequest,
    ) -> Result<Dispute, MarketplaceError> {
        let dispute = sqlx::query_as::<_, Dispute>(
            r#"
            INSERT INTO disputes (rental_id, opened_by, reason, details)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(rental_id)
        .bind(opened_by)
        .bind(&req.reason)
        .bind(&req.details)
        .fetch_one(pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                MarketplaceError::AlreadyExists(format!("Open dispute for rental {}", rental_id))
            }
            other => {
                log::error!("Failed to open dispute for rental {}: {}", rental_id, other);
                MarketplaceError::DatabaseError(other.to_string())
            }
        })?;

        log::info!("Dispute {} opened on rental {}", dispute.id, rental_id);
        Ok(dispute)
    }

    pub async fn list_for_rental(pool: &PgPool, rental_id: Uuid) -> Result<Vec<Dispute>, MarketplaceError> {
        sqlx::query_as::<_, Dispute>(
            "SELECT * FROM disputes WHERE rental_id = $1 ORDER BY created_at DESC",
        )
        .bind(rental_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to list disputes for rental {}: {}", rental_id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })
    }

    /// Close an open dispute; closed disputes are never reopened
    pub async fn resolve(
        pool: &PgPool,
        id: Uuid,
        req: &ResolveDisputeRequest,
    ) -> Result<Dispute, MarketplaceError> {
        let updated = sqlx::query_as::<_, Dispute>(
            r#"
            UPDATE disputes
            SET status = $1, resolution = $2, resolved_at = NOW()
            WHERE id = $3 AND status = 'open'
            RETURNING *
            "#,
        )
        .bind(req.status)
        .bind(&req.resolution)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to resolve dispute {}: {}", id, e);
            MarketplaceError::DatabaseError(e.to_string())
        })?;

        match updated {
            Some(dispute) => {
                log::info!("Dispute {} closed as {:?}", id, dispute.status);
                Ok(dispute)
            }
            None => {
                let exists: bool =
                    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM disputes WHERE id = $1)")
                        .bind(id)
                        .fetch_one(pool)
                        .await
                        .map_err(|e| MarketplaceError::DatabaseError(e.to_string()))?;

                if exists {
                    Err(MarketplaceError::Conflict(format!("Dispute {} is already closed", id)))
                } else {
                    Err(MarketplaceError::NotFound(format!("Dispute {}", id)))
                }
            }
        }
    }
}
