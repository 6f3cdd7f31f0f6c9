// src/models/stats.rs
// DOCUMENTATION: Dashboard and platform statistics DTOs
// PURPOSE: Rows fetched for aggregation and the JSON shapes returned

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{PaymentStatus, RentalStatus};

/// Minimal projection of a rental used for dashboard aggregation
#[derive(Debug, Clone, FromRow)]
pub struct RentalSummaryRow {
    pub renter_id: Uuid,
    pub owner_id: Uuid,
    pub status: RentalStatus,
    pub payment_status: PaymentStatus,
    pub subtotal: Decimal,
    pub total_price: Decimal,
}

/// Listing counts for a single owner
#[derive(Debug, Clone, Default, FromRow)]
pub struct ListingCounts {
    pub total: i64,
    pub available: i64,
}

/// Response for GET /dashboard/stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub listings: i64,
    pub available_listings: i64,
    /// Rentals on the caller's gear, keyed by status
    pub owner_rentals: BTreeMap<String, i64>,
    /// Rentals the caller booked, keyed by status
    pub renter_rentals: BTreeMap<String, i64>,
    /// Requests awaiting the caller's approval
    pub pending_requests: i64,
    pub active_rentals: i64,
    /// Sum of subtotals of paid rentals on the caller's gear
    pub total_earnings: Decimal,
    /// Sum of totals of paid rentals the caller booked
    pub total_spent: Decimal,
    pub unread_messages: i64,
    pub rating_average: Option<Decimal>,
    pub rating_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusCount {
    pub status: RentalStatus,
    pub count: i64,
}

/// Response for GET /admin/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformStats {
    pub users: i64,
    pub gear: i64,
    pub rentals_by_status: Vec<StatusCount>,
    /// Total charged for paid rentals
    pub gross_volume: Decimal,
    pub open_disputes: i64,
}
