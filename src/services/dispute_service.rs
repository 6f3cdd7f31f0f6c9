// src/services/dispute_service.rs

use crate::db::{DisputeRepository, RentalRepository};
use crate::errors::MarketplaceError;
use crate::models::{Dispute, OpenDisputeRequest, Rental, RentalStatus, ResolveDisputeRequest};
use sqlx::PgPool;
use uuid::Uuid;

/// Disputes can be raised once the gear has changed hands
pub fn can_dispute(rental: &Rental) -> bool {
    matches!(rental.status, RentalStatus::Active | RentalStatus::Completed)
}

pub struct DisputeService;

impl DisputeService {
    async fn rental_for_participant(
        pool: &PgPool,
        user_id: Uuid,
        rental_id: Uuid,
    ) -> Result<Rental, MarketplaceError> {
        let rental = RentalRepository::get_by_id(pool, rental_id).await?;
        if !rental.is_participant(user_id) {
            return Err(MarketplaceError::Forbidden);
        }
        Ok(rental)
    }

    pub async fn open_dispute(
        pool: &PgPool,
        user_id: Uuid,
        rental_id: Uuid,
        req: OpenDisputeRequest,
    ) -> Result<Dispute, MarketplaceError> {
        let rental = Self::rental_for_participant(pool, user_id, rental_id).await?;
        if !can_dispute(&rental) {
            return Err(MarketplaceError::Conflict(format!(
                "Disputes need an active or completed rental (currently {})",
                rental.status
            )));
        }

        DisputeRepository::create_dispute(pool, rental.id, user_id, &req).await
    }

    pub async fn list_disputes(
        pool: &PgPool,
        user_id: Uuid,
        rental_id: Uuid,
    ) -> Result<Vec<Dispute>, MarketplaceError> {
        Self::rental_for_participant(pool, user_id, rental_id).await?;
        DisputeRepository::list_for_rental(pool, rental_id).await
    }

    pub async fn resolve_dispute(
        pool: &PgPool,
        id: Uuid,
        req: ResolveDisputeRequest,
    ) -> Result<Dispute, MarketplaceError> {
        DisputeRepository::resolve(pool, id, &req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use crate::services::rental_service::tests::rental;

    #[test]
    fn test_dispute_window() {
        assert!(can_dispute(&rental(RentalStatus::Active, PaymentStatus::Paid)));
        assert!(can_dispute(&rental(RentalStatus::Completed, PaymentStatus::Paid)));
        assert!(!can_dispute(&rental(RentalStatus::Approved, PaymentStatus::Paid)));
        assert!(!can_dispute(&rental(RentalStatus::Cancelled, PaymentStatus::Refunded)));
    }
}
