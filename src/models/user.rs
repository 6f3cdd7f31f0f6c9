// src/models/user.rs
// DOCUMENTATION: User profile records and DTOs
// PURPOSE: Profiles are keyed by the Supabase auth user id

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Row in the users table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Same id as the Supabase auth user (JWT `sub`)
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    /// Average of received review ratings (None until first review)
    pub rating_average: Option<Decimal>,
    pub rating_count: i32,
    pub stripe_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for PUT /users/me
/// All fields are optional - only provided fields are updated
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120))]
    pub full_name: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,

    #[validate(length(max = 2000))]
    pub bio: Option<String>,

    #[validate(length(max = 255))]
    pub location: Option<String>,
}

/// Public view of a user; never exposes email or payment identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub rating_average: Option<Decimal>,
    pub rating_count: i32,
    pub member_since: DateTime<Utc>,
}

impl User {
    pub fn to_public(&self) -> PublicProfile {
        PublicProfile {
            id: self.id,
            full_name: self.full_name.clone(),
            avatar_url: self.avatar_url.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            rating_average: self.rating_average,
            rating_count: self.rating_count,
            member_since: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_profile_hides_private_fields() {
        let user = User {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            full_name: Some("Sam Owner".to_string()),
            avatar_url: None,
            bio: None,
            location: Some("Denver".to_string()),
            rating_average: None,
            rating_count: 0,
            stripe_customer_id: Some("cus_123".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(user.to_public()).unwrap();
        assert!(json.get("email").is_none());
        assert!(json.get("stripe_customer_id").is_none());
        assert_eq!(json["location"], "Denver");
    }

    #[test]
    fn test_update_profile_validation() {
        let req = UpdateProfileRequest {
            full_name: Some(String::new()),
            avatar_url: Some("not a url".to_string()),
            bio: None,
            location: None,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("full_name"));
        assert!(fields.contains_key("avatar_url"));
    }
}
