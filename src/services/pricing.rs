// src/services/pricing.rs
// DOCUMENTATION: Rental price calculation from tiered rates
// PURPOSE: Server-side source of truth for quotes and charged amounts

use crate::errors::MarketplaceError;
use crate::models::{Gear, PriceQuote};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const DAYS_PER_WEEK: i64 = 7;
const DAYS_PER_MONTH: i64 = 30;

/// Rates of a single listing
#[derive(Debug, Clone)]
pub struct GearRates {
    pub daily: Decimal,
    pub weekly: Option<Decimal>,
    pub monthly: Option<Decimal>,
    pub security_deposit: Decimal,
}

impl From<&Gear> for GearRates {
    fn from(gear: &Gear) -> Self {
        GearRates {
            daily: gear.daily_rate,
            weekly: gear.weekly_rate,
            monthly: gear.monthly_rate,
            security_deposit: gear.security_deposit.unwrap_or(Decimal::ZERO),
        }
    }
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price a rental of `days` days
/// DOCUMENTATION: 30-day blocks use the monthly rate, 7-day blocks the weekly rate,
/// leftover days the daily rate. A missing tier folds its days into the next lower tier.
/// The subtotal never exceeds `days * daily`.
pub fn calculate_price(
    rates: &GearRates,
    days: i64,
    service_fee_percent: Decimal,
) -> Result<PriceQuote, MarketplaceError> {
    if days <= 0 {
        return Err(MarketplaceError::InvalidInput(
            "Rental must last at least one day".to_string(),
        ));
    }

    let (months, after_months) = match rates.monthly {
        Some(_) => (days / DAYS_PER_MONTH, days % DAYS_PER_MONTH),
        None => (0, days),
    };
    let (weeks, remaining_days) = match rates.weekly {
        Some(_) => (after_months / DAYS_PER_WEEK, after_months % DAYS_PER_WEEK),
        None => (0, after_months),
    };

    let month_part = rates.monthly.unwrap_or(Decimal::ZERO) * Decimal::from(months);
    let week_part = rates.weekly.unwrap_or(Decimal::ZERO) * Decimal::from(weeks);
    let day_part = rates.daily * Decimal::from(remaining_days);

    let tiered = month_part + week_part + day_part;
    let flat = rates.daily * Decimal::from(days);
    let subtotal = round_cents(tiered.min(flat));

    let service_fee = round_cents(subtotal * service_fee_percent / Decimal::ONE_HUNDRED);

    Ok(PriceQuote {
        days,
        months,
        weeks,
        remaining_days,
        subtotal,
        service_fee,
        total: subtotal + service_fee,
        security_deposit: rates.security_deposit,
    })
}

/// Convert a major-unit amount to the integer minor units payment processors expect
pub fn to_minor_units(amount: Decimal) -> Result<i64, MarketplaceError> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .filter(|cents| *cents >= 0)
        .ok_or_else(|| MarketplaceError::InvalidInput(format!("Invalid amount: {}", amount)))
}
