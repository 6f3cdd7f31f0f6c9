// src/services/rental_service.rs
// DOCUMENTATION: Booking requests and the rental lifecycle
// PURPOSE: Conflict-free booking under a gear row lock, role-checked status changes

use crate::auth::AuthenticatedUser;
use crate::config::Config;
use crate::db::{
    begin_transaction, commit_transaction, GearRepository, NewRental, RentalRepository,
    UserRepository,
};
use crate::errors::MarketplaceError;
use crate::models::{
    CreateRentalRequest, PaymentStatus, Rental, RentalListQuery, RentalStatus,
};
use crate::services::availability::validate_range;
use crate::services::cache::ResponseCache;
use crate::services::gear_service::SEARCH_CACHE_PREFIX;
use crate::services::payments::PaymentProvider;
use crate::services::pricing::{calculate_price, GearRates};
use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Status change requested through POST /rentals/{id}/{action}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalAction {
    Approve,
    Reject,
    Cancel,
    Activate,
    Complete,
}

impl RentalAction {
    pub fn target(&self) -> RentalStatus {
        match self {
            RentalAction::Approve => RentalStatus::Approved,
            RentalAction::Reject => RentalStatus::Rejected,
            RentalAction::Cancel => RentalStatus::Cancelled,
            RentalAction::Activate => RentalStatus::Active,
            RentalAction::Complete => RentalStatus::Completed,
        }
    }

    /// Only cancellation is open to the renter
    fn owner_only(&self) -> bool {
        !matches!(self, RentalAction::Cancel)
    }
}

/// Check that `actor` may apply `action` to the rental as it stands; returns the new status
pub fn check_action(
    rental: &Rental,
    actor: Uuid,
    action: RentalAction,
) -> Result<RentalStatus, MarketplaceError> {
    if !rental.is_participant(actor) || (action.owner_only() && rental.owner_id != actor) {
        log::warn!("User {} may not {:?} rental {}", actor, action, rental.id);
        return Err(MarketplaceError::Forbidden);
    }

    let next = action.target();
    if !rental.status.can_transition_to(next) {
        return Err(MarketplaceError::InvalidStateTransition {
            from: rental.status.to_string(),
            to: next.to_string(),
        });
    }

    if action == RentalAction::Activate && rental.payment_status != PaymentStatus::Paid {
        return Err(MarketplaceError::PaymentError(
            "Rental must be paid before it can start".to_string(),
        ));
    }

    Ok(next)
}

pub struct RentalService;

impl RentalService {
    /// Request a booking
    /// DOCUMENTATION: The gear row stays locked from the conflict check to the insert,
    /// so two overlapping requests can never both succeed
    pub async fn create_rental(
        pool: &PgPool,
        config: &Config,
        cache: &ResponseCache,
        renter: &AuthenticatedUser,
        req: CreateRentalRequest,
    ) -> Result<Rental, MarketplaceError> {
        let days = validate_range(req.start_date, req.end_date, Utc::now().date_naive())?;
        let renter_id = renter.id;
        UserRepository::ensure_user(pool, renter.id, &renter.email).await?;

        let mut tx = begin_transaction(pool).await?;
        let gear = GearRepository::get_for_update(&mut *tx, req.gear_id).await?;

        if gear.owner_id == renter_id {
            return Err(MarketplaceError::InvalidInput(
                "You cannot rent your own gear".to_string(),
            ));
        }
        if !gear.is_available {
            return Err(MarketplaceError::Conflict(
                "Gear is not currently listed for rent".to_string(),
            ));
        }

        let conflicts =
            RentalRepository::overlapping(&mut *tx, gear.id, req.start_date, req.end_date, None).await?;
        if !conflicts.is_empty() {
            log::info!(
                "Booking request for gear {} collides with {} rental(s)",
                gear.id,
                conflicts.len()
            );
            return Err(MarketplaceError::Conflict(
                "Gear is already booked for the requested dates".to_string(),
            ));
        }

        let quote = calculate_price(&GearRates::from(&gear), days, config.service_fee_percent)?;
        let rental = RentalRepository::insert(
            &mut *tx,
            &NewRental {
                gear: &gear,
                renter_id,
                start_date: req.start_date,
                end_date: req.end_date,
                quote: &quote,
                message: req.message.as_deref(),
            },
        )
        .await?;

        commit_transaction(tx).await?;
        log::info!(
            "Rental {} requested for gear {} ({} days, total {})",
            rental.id,
            gear.id,
            days,
            rental.total_price
        );

        Self::invalidate_caches(cache, &rental).await;
        Ok(rental)
    }

    pub async fn list_rentals(
        pool: &PgPool,
        user_id: Uuid,
        query: RentalListQuery,
    ) -> Result<Vec<Rental>, MarketplaceError> {
        RentalRepository::list_for_user(pool, user_id, query.role.unwrap_or_default(), query.status).await
    }

    /// Rental visible to its renter and owner only
    pub async fn get_rental(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<Rental, MarketplaceError> {
        let rental = RentalRepository::get_by_id(pool, id).await?;
        if !rental.is_participant(user_id) {
            return Err(MarketplaceError::Forbidden);
        }
        Ok(rental)
    }

    /// Apply a lifecycle action
    /// DOCUMENTATION: Approval re-checks the calendar with the gear locked;
    /// cancellation releases any payment before the status change commits
    pub async fn transition(
        pool: &PgPool,
        provider: &dyn PaymentProvider,
        cache: &ResponseCache,
        actor: Uuid,
        id: Uuid,
        action: RentalAction,
    ) -> Result<Rental, MarketplaceError> {
        let current = RentalRepository::get_by_id(pool, id).await?;
        check_action(&current, actor, action)?;

        let mut tx = begin_transaction(pool).await?;
        if action == RentalAction::Approve {
            GearRepository::get_for_update(&mut *tx, current.gear_id).await?;
        }

        // State may have moved while we were not holding the lock
        let rental = RentalRepository::get_for_update(&mut *tx, id).await?;
        let next = check_action(&rental, actor, action)?;

        if action == RentalAction::Approve {
            let overlapping = RentalRepository::overlapping(
                &mut *tx,
                rental.gear_id,
                rental.start_date,
                rental.end_date,
                Some(rental.id),
            )
            .await?;

            if overlapping.iter().any(|r| r.status != RentalStatus::Pending) {
                return Err(MarketplaceError::Conflict(
                    "Another approved rental overlaps these dates".to_string(),
                ));
            }
        }

        let cancelled_by = (action == RentalAction::Cancel).then_some(actor);
        let mut updated = RentalRepository::update_status(&mut *tx, id, next, cancelled_by).await?;

        if action == RentalAction::Cancel {
            updated = Self::release_payment(&mut *tx, provider, updated).await?;
        }

        commit_transaction(tx).await?;
        Self::invalidate_caches(cache, &updated).await;
        Ok(updated)
    }

    /// Cancel an open PaymentIntent or refund a captured one
    async fn release_payment(
        conn: &mut PgConnection,
        provider: &dyn PaymentProvider,
        rental: Rental,
    ) -> Result<Rental, MarketplaceError> {
        let intent_id = match rental.payment_intent_id.as_deref() {
            Some(id) => id.to_string(),
            None => return Ok(rental),
        };

        match rental.payment_status {
            PaymentStatus::Paid => {
                provider.refund_payment_intent(&intent_id).await?;
                log::info!("Refunded payment {} for cancelled rental {}", intent_id, rental.id);
                RentalRepository::set_payment_status(conn, rental.id, PaymentStatus::Refunded).await
            }
            PaymentStatus::Processing | PaymentStatus::Failed => {
                provider.cancel_payment_intent(&intent_id).await?;
                log::info!("Cancelled payment {} for rental {}", intent_id, rental.id);
                RentalRepository::set_payment_status(conn, rental.id, PaymentStatus::Failed).await
            }
            PaymentStatus::Unpaid | PaymentStatus::Refunded => Ok(rental),
        }
    }

    /// Rental changes move availability-filtered searches and both dashboards
    pub(crate) async fn invalidate_caches(cache: &ResponseCache, rental: &Rental) {
        cache.invalidate_prefix(SEARCH_CACHE_PREFIX).await;
        cache.invalidate(&ResponseCache::dashboard_key(rental.renter_id)).await;
        cache.invalidate(&ResponseCache::dashboard_key(rental.owner_id)).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    pub(crate) fn rental(status: RentalStatus, payment_status: PaymentStatus) -> Rental {
        Rental {
            id: Uuid::new_v4(),
            gear_id: Uuid::new_v4(),
            renter_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 8, 5).unwrap(),
            status,
            subtotal: Decimal::from(120),
            service_fee: Decimal::from(12),
            total_price: Decimal::from(132),
            security_deposit: Decimal::from(200),
            message: None,
            payment_intent_id: None,
            payment_status,
            cancelled_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_only_actions() {
        let r = rental(RentalStatus::Pending, PaymentStatus::Unpaid);

        assert_eq!(
            check_action(&r, r.owner_id, RentalAction::Approve).unwrap(),
            RentalStatus::Approved
        );
        assert!(matches!(
            check_action(&r, r.renter_id, RentalAction::Approve),
            Err(MarketplaceError::Forbidden)
        ));
        assert!(matches!(
            check_action(&r, r.renter_id, RentalAction::Reject),
            Err(MarketplaceError::Forbidden)
        ));
        assert!(matches!(
            check_action(&r, Uuid::new_v4(), RentalAction::Cancel),
            Err(MarketplaceError::Forbidden)
        ));
    }

    #[test]
    fn test_either_side_can_cancel() {
        let r = rental(RentalStatus::Approved, PaymentStatus::Paid);
        assert!(check_action(&r, r.renter_id, RentalAction::Cancel).is_ok());
        assert!(check_action(&r, r.owner_id, RentalAction::Cancel).is_ok());

        let active = rental(RentalStatus::Active, PaymentStatus::Paid);
        assert!(matches!(
            check_action(&active, active.renter_id, RentalAction::Cancel),
            Err(MarketplaceError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_invalid_transitions() {
        let r = rental(RentalStatus::Completed, PaymentStatus::Paid);
        match check_action(&r, r.owner_id, RentalAction::Approve) {
            Err(MarketplaceError::InvalidStateTransition { from, to }) => {
                assert_eq!(from, "completed");
                assert_eq!(to, "approved");
            }
            other => panic!("unexpected: {:?}", other),
        }

        let pending = rental(RentalStatus::Pending, PaymentStatus::Unpaid);
        assert!(check_action(&pending, pending.owner_id, RentalAction::Complete).is_err());
    }

    #[test]
    fn test_activation_requires_payment() {
        let unpaid = rental(RentalStatus::Approved, PaymentStatus::Processing);
        assert!(matches!(
            check_action(&unpaid, unpaid.owner_id, RentalAction::Activate),
            Err(MarketplaceError::PaymentError(_))
        ));

        let paid = rental(RentalStatus::Approved, PaymentStatus::Paid);
        assert_eq!(
            check_action(&paid, paid.owner_id, RentalAction::Activate).unwrap(),
            RentalStatus::Active
        );
    }

    mod db {
        use super::*;
        use crate::db::test_fixtures::{day, insert_gear, insert_rental, insert_user};
        use crate::services::payments::dummy::DummyProvider;

        fn user(id: Uuid) -> AuthenticatedUser {
            AuthenticatedUser {
                id,
                email: format!("{}@example.com", id),
                role: "authenticated".to_string(),
            }
        }

        fn request(gear_id: Uuid, start: i64, end: i64) -> CreateRentalRequest {
            CreateRentalRequest {
                gear_id,
                start_date: day(start),
                end_date: day(end),
                message: None,
            }
        }

        #[sqlx::test]
        async fn test_overlapping_booking_conflicts(pool: PgPool) {
            let config = Config::for_tests();
            let cache = ResponseCache::new(60);
            let owner = insert_user(&pool).await;
            let gear = insert_gear(&pool, owner, "Canoe", "water", 40).await;
            let first = user(Uuid::new_v4());
            let second = user(Uuid::new_v4());

            let booked = RentalService::create_rental(&pool, &config, &cache, &first, request(gear.id, 10, 13))
                .await
                .unwrap();
            assert_eq!(booked.status, RentalStatus::Pending);
            assert_eq!(booked.subtotal, Decimal::from(120));
            assert_eq!(booked.owner_id, owner);

            let clash = RentalService::create_rental(&pool, &config, &cache, &second, request(gear.id, 12, 15)).await;
            assert!(matches!(clash, Err(MarketplaceError::Conflict(_))));

            // Returning day of one rental is the pickup day of the next
            RentalService::create_rental(&pool, &config, &cache, &second, request(gear.id, 13, 15))
                .await
                .unwrap();
        }

        #[sqlx::test]
        async fn test_concurrent_bookings_only_one_wins(pool: PgPool) {
            let config = Config::for_tests();
            let cache = ResponseCache::new(60);
            let owner = insert_user(&pool).await;
            let gear = insert_gear(&pool, owner, "Roof box", "travel", 12).await;
            let first = user(Uuid::new_v4());
            let second = user(Uuid::new_v4());

            let (a, b) = tokio::join!(
                RentalService::create_rental(&pool, &config, &cache, &first, request(gear.id, 20, 24)),
                RentalService::create_rental(&pool, &config, &cache, &second, request(gear.id, 22, 26)),
            );

            assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
            let loser = if a.is_ok() { b } else { a };
            assert!(matches!(loser, Err(MarketplaceError::Conflict(_))));
        }

        #[sqlx::test]
        async fn test_own_and_unlisted_gear_cannot_be_booked(pool: PgPool) {
            let config = Config::for_tests();
            let cache = ResponseCache::new(60);
            let owner = insert_user(&pool).await;
            let gear = insert_gear(&pool, owner, "Tandem bike", "bike", 35).await;

            let own = RentalService::create_rental(&pool, &config, &cache, &user(owner), request(gear.id, 3, 5)).await;
            assert!(matches!(own, Err(MarketplaceError::InvalidInput(_))));

            sqlx::query("UPDATE gear SET is_available = false WHERE id = $1")
                .bind(gear.id)
                .execute(&pool)
                .await
                .unwrap();
            let unlisted =
                RentalService::create_rental(&pool, &config, &cache, &user(Uuid::new_v4()), request(gear.id, 3, 5))
                    .await;
            assert!(matches!(unlisted, Err(MarketplaceError::Conflict(_))));
        }

        #[sqlx::test]
        async fn test_approve_blocked_by_approved_overlap(pool: PgPool) {
            let cache = ResponseCache::new(60);
            let provider = DummyProvider::default();
            let owner = insert_user(&pool).await;
            let renter_a = insert_user(&pool).await;
            let renter_b = insert_user(&pool).await;
            let gear = insert_gear(&pool, owner, "Drone", "camera", 60).await;
            let a = insert_rental(&pool, &gear, renter_a, day(5), day(9), RentalStatus::Pending).await;
            let b = insert_rental(&pool, &gear, renter_b, day(7), day(10), RentalStatus::Pending).await;

            let approved = RentalService::transition(&pool, &provider, &cache, owner, a.id, RentalAction::Approve)
                .await
                .unwrap();
            assert_eq!(approved.status, RentalStatus::Approved);

            let second = RentalService::transition(&pool, &provider, &cache, owner, b.id, RentalAction::Approve).await;
            assert!(matches!(second, Err(MarketplaceError::Conflict(_))));

            let rejected = RentalService::transition(&pool, &provider, &cache, owner, b.id, RentalAction::Reject)
                .await
                .unwrap();
            assert_eq!(rejected.status, RentalStatus::Rejected);
        }
    }
}
