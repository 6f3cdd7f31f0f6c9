// src/models/gear.rs
// DOCUMENTATION: Core data structures for gear listings
// PURPOSE: Defines serialization models for listing API and database rows

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{PriceQuote, PublicProfile, RentalStatus, ReviewResponse};
use crate::errors::MarketplaceError;

/// Represents a complete gear listing from the database
/// DOCUMENTATION: Maps directly to the gear table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Gear {
    /// Unique identifier (UUID v4)
    pub id: Uuid,

    /// Listing owner
    pub owner_id: Uuid,

    /// Short listing title
    pub title: String,

    pub description: Option<String>,

    /// Category slug: camera, camping, audio, bike, tools, ...
    pub category: String,

    pub brand: Option<String>,
    pub model: Option<String>,

    /// Condition descriptor (new, like_new, good, fair)
    pub condition: Option<String>,

    /// Free-form pickup location (city or neighborhood)
    pub location: Option<String>,

    /// Price per day (always set)
    pub daily_rate: Decimal,

    /// Price per 7-day block
    pub weekly_rate: Option<Decimal>,

    /// Price per 30-day block
    pub monthly_rate: Option<Decimal>,

    /// Refundable deposit collected with the rental payment
    pub security_deposit: Option<Decimal>,

    /// Image URLs, first one is the cover
    pub images: Vec<String>,

    /// Owner's listing switch; false hides the gear from booking
    pub is_available: bool,

    pub rating_average: Option<Decimal>,
    pub rating_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn validate_positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

pub(crate) fn validate_non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    Ok(())
}

/// Request DTO for creating a new listing
/// DOCUMENTATION: Data transfer object for POST /gear endpoint
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct CreateGearRequest {
    #[validate(length(min = 3, max = 120))]
    pub title: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub category: String,

    pub brand: Option<String>,
    pub model: Option<String>,
    pub condition: Option<String>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(custom = "validate_positive_amount")]
    pub daily_rate: Decimal,

    #[validate(custom = "validate_positive_amount")]
    pub weekly_rate: Option<Decimal>,

    #[validate(custom = "validate_positive_amount")]
    pub monthly_rate: Option<Decimal>,

    #[validate(custom = "validate_non_negative_amount")]
    pub security_deposit: Option<Decimal>,

    #[serde(default)]
    #[validate(length(max = 12))]
    pub images: Vec<String>,
}

/// Request DTO for updating an existing listing
/// DOCUMENTATION: Data transfer object for PUT /gear/{id} endpoint
/// All fields are optional - only provided fields are updated
#[derive(Debug, Serialize, Deserialize, Validate, Default)]
pub struct UpdateGearRequest {
    #[validate(length(min = 3, max = 120))]
    pub title: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub category: Option<String>,

    pub brand: Option<String>,
    pub model: Option<String>,
    pub condition: Option<String>,

    #[validate(length(max = 255))]
    pub location: Option<String>,

    #[validate(custom = "validate_positive_amount")]
    pub daily_rate: Option<Decimal>,

    #[validate(custom = "validate_positive_amount")]
    pub weekly_rate: Option<Decimal>,

    #[validate(custom = "validate_positive_amount")]
    pub monthly_rate: Option<Decimal>,

    #[validate(custom = "validate_non_negative_amount")]
    pub security_deposit: Option<Decimal>,

    #[validate(length(max = 12))]
    pub images: Option<Vec<String>>,

    pub is_available: Option<bool>,
}

/// Sort order for listing search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GearSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
}

impl GearSort {
    pub fn order_clause(&self) -> &'static str {
        match self {
            GearSort::Newest => "g.created_at DESC",
            GearSort::PriceAsc => "g.daily_rate ASC, g.created_at DESC",
            GearSort::PriceDesc => "g.daily_rate DESC, g.created_at DESC",
            GearSort::Rating => "g.rating_average DESC NULLS LAST, g.rating_count DESC",
        }
    }
}

/// Search query parameters
/// DOCUMENTATION: DTO for parsing query string in GET /gear
/// All parameters are optional for flexible searching
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GearSearchQuery {
    /// Text search on title and description
    pub q: Option<String>,

    pub category: Option<String>,

    pub location: Option<String>,

    /// Bounds on daily_rate
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,

    pub owner_id: Option<Uuid>,

    /// When both are set only gear free for [start_date, end_date) is returned
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub sort: Option<GearSort>,

    /// Page number (1-based)
    pub page: Option<i64>,

    /// Results per page (max 100)
    pub limit: Option<i64>,
}

/// Deepest page a search may ask for
pub const MAX_SEARCH_PAGE: i64 = 10_000;

impl GearSearchQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(20).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Reject filters that cannot form a query
    pub fn check(&self) -> Result<(), MarketplaceError> {
        if self.page() > MAX_SEARCH_PAGE {
            return Err(MarketplaceError::ValidationError(format!(
                "page must be at most {}",
                MAX_SEARCH_PAGE
            )));
        }

        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end <= start => Err(MarketplaceError::ValidationError(
                "end_date must be after start_date".to_string(),
            )),
            (Some(_), None) | (None, Some(_)) => Err(MarketplaceError::ValidationError(
                "start_date and end_date must be given together".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Deterministic cache key covering every filter
    /// DOCUMENTATION: Filters are encoded as a JSON array so free text cannot
    /// shift values between fields
    pub fn cache_key(&self) -> String {
        let filters = serde_json::json!([
            self.q.as_deref().map(str::to_lowercase),
            self.category,
            self.location.as_deref().map(str::to_lowercase),
            self.min_price.map(|p| p.normalize().to_string()),
            self.max_price.map(|p| p.normalize().to_string()),
            self.owner_id,
            self.start_date,
            self.end_date,
            self.sort.unwrap_or_default(),
            self.page(),
            self.limit(),
        ]);
        format!("gear:search:{}", filters)
    }
}

/// Paginated search response
#[derive(Debug, Serialize, Deserialize)]
pub struct GearSearchResponse {
    pub data: Vec<Gear>,

    /// Total number of matches (regardless of pagination)
    pub total_count: i64,

    pub page: i64,
    pub limit: i64,

    /// Whether more results exist on next page
    pub has_more: bool,
}

/// Detailed response for GET /gear/{id}
#[derive(Debug, Serialize)]
pub struct GearDetailResponse {
    #[serde(flatten)]
    pub gear: Gear,
    pub owner: PublicProfile,
    pub reviews: Vec<ReviewResponse>,
}

/// Query for GET /gear/{id}/availability
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A date range already claimed by a non-terminal rental
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct BookedRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RentalStatus,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub gear_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub available: bool,
    pub conflicts: Vec<BookedRange>,
    pub quote: PriceQuote,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn valid_request() -> CreateGearRequest {
        CreateGearRequest {
            title: "Sony A7 III".to_string(),
            description: Some("Full-frame mirrorless body".to_string()),
            category: "camera".to_string(),
            brand: Some("Sony".to_string()),
            model: Some("A7 III".to_string()),
            condition: Some("good".to_string()),
            location: Some("Portland".to_string()),
            daily_rate: Decimal::from(45),
            weekly_rate: Some(Decimal::from(250)),
            monthly_rate: None,
            security_deposit: Some(Decimal::from(300)),
            images: vec![],
        }
    }

    #[test]
    fn test_create_request_validation() {
        assert!(valid_request().validate().is_ok());

        let mut req = valid_request();
        req.daily_rate = Decimal::ZERO;
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.weekly_rate = Some(Decimal::from_str("-5").unwrap());
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.title = "ab".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_search_pagination_bounds() {
        let query = GearSearchQuery {
            page: Some(0),
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 100);
        assert_eq!(query.offset(), 0);

        let query = GearSearchQuery {
            page: Some(3),
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_huge_page_is_rejected_without_overflow() {
        let query = GearSearchQuery {
            page: Some(i64::MAX),
            limit: Some(100),
            ..Default::default()
        };
        assert_eq!(query.offset(), i64::MAX);
        assert!(matches!(query.check(), Err(MarketplaceError::ValidationError(_))));

        let last = GearSearchQuery {
            page: Some(MAX_SEARCH_PAGE),
            ..Default::default()
        };
        assert!(last.check().is_ok());
    }

    #[test]
    fn test_check_date_filters() {
        let half_open = GearSearchQuery {
            start_date: NaiveDate::from_ymd_opt(2030, 5, 1),
            ..Default::default()
        };
        assert!(half_open.check().is_err());

        let inverted = GearSearchQuery {
            start_date: NaiveDate::from_ymd_opt(2030, 5, 3),
            end_date: NaiveDate::from_ymd_opt(2030, 5, 1),
            ..Default::default()
        };
        assert!(inverted.check().is_err());
    }

    #[test]
    fn test_cache_key_distinguishes_filters() {
        let base = GearSearchQuery {
            category: Some("camping".to_string()),
            ..Default::default()
        };
        let mut other = base.clone();
        other.sort = Some(GearSort::PriceAsc);

        assert_eq!(base.cache_key(), base.clone().cache_key());
        assert_ne!(base.cache_key(), other.cache_key());
        assert!(base.cache_key().starts_with("gear:search:"));
    }

    #[test]
    fn test_cache_key_separator_in_text_does_not_collide() {
        let a = GearSearchQuery {
            q: Some("tent:camping".to_string()),
            ..Default::default()
        };
        let b = GearSearchQuery {
            q: Some("tent".to_string()),
            category: Some("camping".to_string()),
            ..Default::default()
        };
        let c = GearSearchQuery {
            q: Some("tent".to_string()),
            location: Some("camping".to_string()),
            ..Default::default()
        };

        assert_ne!(a.cache_key(), b.cache_key());
        assert_ne!(b.cache_key(), c.cache_key());
    }

    #[test]
    fn test_sort_deserializes_snake_case() {
        let sort: GearSort = serde_json::from_str("\"price_desc\"").unwrap();
        assert_eq!(sort, GearSort::PriceDesc);
    }
}
