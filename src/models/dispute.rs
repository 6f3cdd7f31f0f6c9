// src/models/dispute.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispute_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisputeStatus {
    Open,
    Resolved,
    Dismissed,
}

/// Dispute raised by a participant of an active or completed rental
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Dispute {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub opened_by: Uuid,
    pub reason: String,
    pub details: Option<String>,
    pub status: DisputeStatus,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OpenDisputeRequest {
    #[validate(length(min = 3, max = 200))]
    pub reason: String,

    #[validate(length(max = 5000))]
    pub details: Option<String>,
}

fn validate_closing_status(status: &DisputeStatus) -> Result<(), ValidationError> {
    if *status == DisputeStatus::Open {
        return Err(ValidationError::new("must_close_dispute"));
    }
    Ok(())
}

/// Admin request for POST /admin/disputes/{id}/resolve
#[derive(Debug, Deserialize, Validate)]
pub struct ResolveDisputeRequest {
    #[validate(custom = "validate_closing_status")]
    pub status: DisputeStatus,

    #[validate(length(min = 1, max = 5000))]
    pub resolution: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_must_close() {
        let req = ResolveDisputeRequest {
            status: DisputeStatus::Open,
            resolution: "reopened".to_string(),
        };
        assert!(req.validate().is_err());

        let req = ResolveDisputeRequest {
            status: DisputeStatus::Dismissed,
            resolution: "No evidence of damage".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
