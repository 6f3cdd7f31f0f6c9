// src/auth.rs
// DOCUMENTATION: Request authentication
// PURPOSE: Supabase session JWTs for users, X-Admin-Token for admin routes

use crate::config::Config;
use crate::errors::MarketplaceError;
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use uuid::Uuid;

/// Audience Supabase puts on tokens of signed-in users
const SUPABASE_AUDIENCE: &str = "authenticated";

/// Claims we read from a Supabase access token
#[derive(Debug, Serialize, Deserialize)]
pub struct SupabaseClaims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub aud: String,
    pub exp: i64,
}

/// The caller behind a valid bearer token
/// DOCUMENTATION: Add as a handler argument to require authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<SupabaseClaims> for AuthenticatedUser {
    fn from(claims: SupabaseClaims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email.unwrap_or_default(),
            role: claims.role.unwrap_or_else(|| SUPABASE_AUDIENCE.to_string()),
        }
    }
}

/// Verify an HS256 token signed with the project's JWT secret
pub fn verify_token(token: &str, secret: &str) -> Result<AuthenticatedUser, MarketplaceError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SUPABASE_AUDIENCE]);

    let key = DecodingKey::from_secret(secret.as_bytes());
    let data = decode::<SupabaseClaims>(token, &key, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::ExpiredSignature => log::debug!("Rejected expired token"),
            _ => log::warn!("Rejected invalid token: {}", e),
        }
        MarketplaceError::Unauthorized
    })?;

    Ok(data.claims.into())
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, MarketplaceError> {
    let config = req.app_data::<web::Data<Config>>().ok_or_else(|| {
        log::error!("Config missing from app data");
        MarketplaceError::InternalError
    })?;

    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(MarketplaceError::Unauthorized)?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(MarketplaceError::Unauthorized)?;

    verify_token(token, &config.supabase_jwt_secret)
}

impl FromRequest for AuthenticatedUser {
    type Error = MarketplaceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

/// Verify admin token from request headers
/// DOCUMENTATION: Missing header is 401, wrong token is 403
pub fn verify_admin_token(req: &HttpRequest, config: &Config) -> Result<(), MarketplaceError> {
    let token = req
        .headers()
        .get("X-Admin-Token")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            log::warn!("Admin request without token");
            MarketplaceError::Unauthorized
        })?;

    if config.admin_token.is_empty() || token != config.admin_token {
        log::warn!("Admin request with invalid token");
        return Err(MarketplaceError::Forbidden);
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use actix_web::test::TestRequest;
    use jsonwebtoken::{encode, EncodingKey, Header};

    /// Sign a token the way Supabase does
    pub(crate) fn token_for(user_id: Uuid, secret: &str, exp_offset: i64, aud: &str) -> String {
        let claims = SupabaseClaims {
            sub: user_id,
            email: Some("renter@example.com".to_string()),
            role: Some("authenticated".to_string()),
            aud: aud.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn request_with(auth: Option<String>) -> HttpRequest {
        let mut req = TestRequest::default().app_data(web::Data::new(Config::for_tests()));
        if let Some(value) = auth {
            req = req.insert_header(("Authorization", value));
        }
        req.to_http_request()
    }

    #[test]
    fn test_valid_token() {
        let id = Uuid::new_v4();
        let token = token_for(id, "test-jwt-secret", 3600, "authenticated");

        let user = authenticate(&request_with(Some(format!("Bearer {}", token)))).unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "renter@example.com");
        assert_eq!(user.role, "authenticated");
    }

    #[test]
    fn test_rejected_tokens() {
        let id = Uuid::new_v4();

        assert!(matches!(
            authenticate(&request_with(None)),
            Err(MarketplaceError::Unauthorized)
        ));
        assert!(authenticate(&request_with(Some("Basic abc".to_string()))).is_err());

        let wrong_secret = token_for(id, "other-secret", 3600, "authenticated");
        assert!(authenticate(&request_with(Some(format!("Bearer {}", wrong_secret)))).is_err());

        let expired = token_for(id, "test-jwt-secret", -3600, "authenticated");
        assert!(authenticate(&request_with(Some(format!("Bearer {}", expired)))).is_err());

        let wrong_audience = token_for(id, "test-jwt-secret", 3600, "anon");
        assert!(authenticate(&request_with(Some(format!("Bearer {}", wrong_audience)))).is_err());
    }

    #[test]
    fn test_admin_token() {
        let config = Config::for_tests();

        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            verify_admin_token(&req, &config),
            Err(MarketplaceError::Unauthorized)
        ));

        let req = TestRequest::default()
            .insert_header(("X-Admin-Token", "wrong"))
            .to_http_request();
        assert!(matches!(
            verify_admin_token(&req, &config),
            Err(MarketplaceError::Forbidden)
        ));

        let req = TestRequest::default()
            .insert_header(("X-Admin-Token", "admin-secret"))
            .to_http_request();
        assert!(verify_admin_token(&req, &config).is_ok());
    }

    #[test]
    fn test_unset_admin_token_disables_admin_routes() {
        let mut config = Config::for_tests();
        config.admin_token = String::new();

        let req = TestRequest::default()
            .insert_header(("X-Admin-Token", ""))
            .to_http_request();
        assert!(verify_admin_token(&req, &config).is_err());
    }
}
