// src/models/rental.rs
// DOCUMENTATION: Rental booking records, lifecycle statuses and DTOs
// PURPOSE: Shared by rental, payment, review and dashboard code paths

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a rental
/// DOCUMENTATION: Stored as the Postgres enum `rental_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rental_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    Pending,
    Approved,
    Rejected,
    Active,
    Completed,
    Cancelled,
}

impl RentalStatus {
    pub const BLOCKING: [RentalStatus; 3] = [
        RentalStatus::Pending,
        RentalStatus::Approved,
        RentalStatus::Active,
    ];

    /// Non-terminal statuses hold the gear's calendar
    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING.contains(self)
    }

    /// Allowed lifecycle moves
    pub fn can_transition_to(&self, next: RentalStatus) -> bool {
        use RentalStatus::*;
        matches!(
            (self, next),
            (Pending, Approved)
                | (Pending, Rejected)
                | (Pending, Cancelled)
                | (Approved, Active)
                | (Approved, Cancelled)
                | (Active, Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Approved => "approved",
            RentalStatus::Rejected => "rejected",
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment state of a rental, driven by PaymentIntent webhooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Processing,
    Paid,
    Refunded,
    Failed,
}

impl PaymentStatus {
    /// Final states are never overwritten by late webhook deliveries
    pub fn is_final(&self) -> bool {
        matches!(self, PaymentStatus::Paid | PaymentStatus::Refunded)
    }
}

/// Row in the rentals table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rental {
    pub id: Uuid,
    pub gear_id: Uuid,
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    /// First rental day (inclusive)
    pub start_date: NaiveDate,
    /// Return day (exclusive)
    pub end_date: NaiveDate,
    pub status: RentalStatus,
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub total_price: Decimal,
    pub security_deposit: Decimal,
    pub message: Option<String>,
    pub payment_intent_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub cancelled_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.renter_id == user_id || self.owner_id == user_id
    }

    /// The other side of the booking, if `user_id` is part of it
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.renter_id {
            Some(self.owner_id)
        } else if user_id == self.owner_id {
            Some(self.renter_id)
        } else {
            None
        }
    }

    /// Amount charged through the payment processor
    pub fn amount_due(&self) -> Decimal {
        self.total_price + self.security_deposit
    }
}

/// Price breakdown for a date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub days: i64,
    pub months: i64,
    pub weeks: i64,
    pub remaining_days: i64,
    pub subtotal: Decimal,
    pub service_fee: Decimal,
    pub total: Decimal,
    pub security_deposit: Decimal,
}

/// Request DTO for POST /rentals
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateRentalRequest {
    pub gear_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Optional note to the owner
    #[validate(length(max = 1000))]
    pub message: Option<String>,
}

/// Which side of the rental the caller is looking from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RentalRole {
    #[default]
    Renter,
    Owner,
}

/// Query for GET /rentals
#[derive(Debug, Deserialize, Default)]
pub struct RentalListQuery {
    pub role: Option<RentalRole>,
    pub status: Option<RentalStatus>,
}

/// Response for POST /rentals/{id}/payment-intent
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    /// Amount in minor units (cents)
    pub amount: i64,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rental(status: RentalStatus) -> Rental {
        Rental {
            id: Uuid::new_v4(),
            gear_id: Uuid::new_v4(),
            renter_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 4).unwrap(),
            status,
            subtotal: Decimal::from(90),
            service_fee: Decimal::from(9),
            total_price: Decimal::from(99),
            security_deposit: Decimal::from(50),
            message: None,
            payment_intent_id: None,
            payment_status: PaymentStatus::Unpaid,
            cancelled_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_transition_table() {
        use RentalStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Approved.can_transition_to(Active));
        assert!(Approved.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Completed));

        assert!(!Pending.can_transition_to(Active));
        assert!(!Active.can_transition_to(Cancelled));
        assert!(!Completed.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(!Cancelled.can_transition_to(Approved));
    }

    #[test]
    fn test_blocking_statuses() {
        assert!(RentalStatus::Pending.is_blocking());
        assert!(RentalStatus::Approved.is_blocking());
        assert!(RentalStatus::Active.is_blocking());
        assert!(!RentalStatus::Cancelled.is_blocking());
        assert!(!RentalStatus::Completed.is_blocking());
        assert!(!RentalStatus::Rejected.is_blocking());
    }

    #[test]
    fn test_counterparty_and_amount_due() {
        let r = rental(RentalStatus::Approved);
        assert_eq!(r.counterparty(r.renter_id), Some(r.owner_id));
        assert_eq!(r.counterparty(r.owner_id), Some(r.renter_id));
        assert_eq!(r.counterparty(Uuid::new_v4()), None);
        assert_eq!(r.amount_due(), Decimal::from(149));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&RentalStatus::Cancelled).unwrap(),
            "\"cancelled\""
        );
        let parsed: PaymentStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert!(parsed.is_final());
        assert!(!PaymentStatus::Processing.is_final());
    }
}
