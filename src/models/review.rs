// src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Review left by one rental participant about the other
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub gear_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a new review
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub rental_id: Uuid,

    #[validate(range(min = 1, max = 5))]
    pub rating: i16,

    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

/// Review response DTO exposed via API, joined with the reviewer's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReviewResponse {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub gear_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewer_name: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
