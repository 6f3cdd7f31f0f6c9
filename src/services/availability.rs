// src/services/availability.rs
// DOCUMENTATION: Date-range validation and overlap detection
// PURPOSE: Decide whether a gear is free for a requested [start, end) range

use crate::errors::MarketplaceError;
use crate::models::BookedRange;
use chrono::NaiveDate;

/// Longest rental accepted in one booking
pub const MAX_RENTAL_DAYS: i64 = 365;

/// Half-open ranges [a_start, a_end) and [b_start, b_end) share at least one day
pub fn ranges_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Check a requested range against today's date; returns the number of days
pub fn validate_range(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
) -> Result<i64, MarketplaceError> {
    if end <= start {
        return Err(MarketplaceError::ValidationError(
            "end_date must be after start_date".to_string(),
        ));
    }

    if start < today {
        return Err(MarketplaceError::ValidationError(
            "start_date cannot be in the past".to_string(),
        ));
    }

    let days = (end - start).num_days();
    if days > MAX_RENTAL_DAYS {
        return Err(MarketplaceError::ValidationError(format!(
            "Rentals are limited to {} days",
            MAX_RENTAL_DAYS
        )));
    }

    Ok(days)
}

/// Existing blocking rentals that collide with the requested range
pub fn find_conflicts(
    start: NaiveDate,
    end: NaiveDate,
    existing: &[BookedRange],
) -> Vec<BookedRange> {
    existing
        .iter()
        .filter(|r| r.status.is_blocking())
        .filter(|r| ranges_overlap(start, end, r.start_date, r.end_date))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RentalStatus;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, day).unwrap()
    }

    fn booked(start: u32, end: u32, status: RentalStatus) -> BookedRange {
        BookedRange {
            start_date: d(start),
            end_date: d(end),
            status,
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        // Back-to-back rentals share a handover day without conflicting
        assert!(!ranges_overlap(d(1), d(5), d(5), d(8)));
        assert!(!ranges_overlap(d(5), d(8), d(1), d(5)));

        assert!(ranges_overlap(d(1), d(5), d(4), d(8)));
        assert!(ranges_overlap(d(2), d(3), d(1), d(10)));
        assert!(ranges_overlap(d(1), d(10), d(2), d(3)));
    }

    #[test]
    fn test_validate_range() {
        let today = d(10);
        assert_eq!(validate_range(d(10), d(12), today).unwrap(), 2);
        assert!(validate_range(d(12), d(12), today).is_err());
        assert!(validate_range(d(13), d(12), today).is_err());
        assert!(validate_range(d(9), d(12), today).is_err());

        let far = today + chrono::Duration::days(MAX_RENTAL_DAYS + 1);
        assert!(validate_range(today, far, today).is_err());
    }

    #[test]
    fn test_find_conflicts_ignores_terminal_rentals() {
        let existing = vec![
            booked(1, 4, RentalStatus::Approved),
            booked(5, 9, RentalStatus::Cancelled),
            booked(8, 12, RentalStatus::Pending),
            booked(20, 25, RentalStatus::Active),
        ];

        let conflicts = find_conflicts(d(3), d(10), &existing);
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0], booked(1, 4, RentalStatus::Approved));
        assert_eq!(conflicts[1], booked(8, 12, RentalStatus::Pending));

        assert!(find_conflicts(d(12), d(20), &existing).is_empty());
    }
}
