// src/services/rate_limiter.rs
// DOCUMENTATION: Keyed request rate limiting backed by governor (GCRA)
// PURPOSE: Per-client limit on every request, tighter per-user limit on writes

use crate::errors::MarketplaceError;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::web;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Paths that are never rate limited (health checks and processor callbacks)
const EXEMPT_PREFIXES: [&str; 2] = ["/health", "/payments/webhook"];

fn per_minute(limit: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN))
}

/// Both limiters, shared through app data
pub struct RateLimiters {
    api: DefaultKeyedRateLimiter<String>,
    writes: DefaultKeyedRateLimiter<Uuid>,
    trusted_proxies: Vec<IpAddr>,
}

impl RateLimiters {
    pub fn new(api_per_minute: u32, writes_per_minute: u32) -> Self {
        Self {
            api: RateLimiter::keyed(per_minute(api_per_minute)),
            writes: RateLimiter::keyed(per_minute(writes_per_minute)),
            trusted_proxies: Vec::new(),
        }
    }

    /// Peers whose forwarding headers name the real client
    pub fn with_trusted_proxies(mut self, proxies: Vec<IpAddr>) -> Self {
        self.trusted_proxies = proxies;
        self
    }

    /// Key for the general limit: the socket peer, or the forwarded client
    /// address when the peer is a trusted proxy
    pub fn client_key(&self, req: &ServiceRequest) -> String {
        match req.peer_addr().map(|addr| addr.ip()) {
            Some(peer) if self.trusted_proxies.contains(&peer) => req
                .connection_info()
                .realip_remote_addr()
                .map(str::to_string)
                .unwrap_or_else(|| peer.to_string()),
            Some(peer) => peer.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// General limit keyed by client address
    pub fn check_client(&self, client: &str) -> Result<(), MarketplaceError> {
        self.api.check_key(&client.to_string()).map_err(|_| {
            log::warn!("Rate limit exceeded for client {}", client);
            MarketplaceError::RateLimitExceeded
        })
    }

    /// Limit on mutating actions keyed by user id
    pub fn check_write(&self, user_id: Uuid) -> Result<(), MarketplaceError> {
        self.writes.check_key(&user_id).map_err(|_| {
            log::warn!("Write rate limit exceeded for user {}", user_id);
            MarketplaceError::RateLimitExceeded
        })
    }

    /// Forget keys whose state has fully replenished
    pub fn retain_recent(&self) {
        self.api.retain_recent();
        self.writes.retain_recent();
        self.api.shrink_to_fit();
        self.writes.shrink_to_fit();
    }

    pub fn tracked_keys(&self) -> usize {
        self.api.len() + self.writes.len()
    }
}

/// Start background task that drops stale limiter keys
pub fn start_limiter_cleanup_task(limiters: Arc<RateLimiters>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            limiters.retain_recent();
            log::debug!("Rate limiter tracking {} keys", limiters.tracked_keys());
        }
    });
}

/// Middleware applying the per-client limit
/// DOCUMENTATION: Registered with `middleware::from_fn(rate_limit)`
pub async fn rate_limit(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let exempt = EXEMPT_PREFIXES.iter().any(|p| req.path().starts_with(p));

    let verdict = match req.app_data::<web::Data<Arc<RateLimiters>>>() {
        Some(limiters) if !exempt => limiters.check_client(&limiters.client_key(&req)),
        _ => Ok(()),
    };

    if let Err(err) = verdict {
        return Ok(req.error_response(err).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, middleware::from_fn, test as actix_test, App, HttpResponse};

    #[test]
    fn test_client_limit_is_per_key() {
        let limiters = RateLimiters::new(2, 1);

        assert!(limiters.check_client("10.0.0.1").is_ok());
        assert!(limiters.check_client("10.0.0.1").is_ok());
        assert!(matches!(
            limiters.check_client("10.0.0.1"),
            Err(MarketplaceError::RateLimitExceeded)
        ));

        // Separate client keeps its own allowance
        assert!(limiters.check_client("10.0.0.2").is_ok());
    }

    #[test]
    fn test_write_limit() {
        let limiters = RateLimiters::new(100, 1);
        let user = Uuid::new_v4();

        assert!(limiters.check_write(user).is_ok());
        assert!(limiters.check_write(user).is_err());
        assert!(limiters.check_write(Uuid::new_v4()).is_ok());
        assert_eq!(limiters.tracked_keys(), 2);
    }

    #[actix_web::test]
    async fn test_middleware_rejects_after_quota() {
        let limiters = Arc::new(RateLimiters::new(2, 1));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(limiters))
                .wrap(from_fn(rate_limit))
                .route("/gear", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/health", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        for _ in 0..2 {
            let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/gear").to_request()).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/gear").to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        // Health checks bypass the limiter
        let resp = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    fn from_peer(peer: &str, forwarded_for: &str) -> actix_web::test::TestRequest {
        actix_test::TestRequest::get()
            .uri("/gear")
            .peer_addr(peer.parse().unwrap())
            .insert_header(("X-Forwarded-For", forwarded_for.to_string()))
    }

    #[actix_web::test]
    async fn test_forwarded_header_ignored_from_untrusted_peer() {
        let limiters = Arc::new(RateLimiters::new(2, 1));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(limiters.clone()))
                .wrap(from_fn(rate_limit))
                .route("/gear", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let mut succeeded = 0;
        for i in 0..50 {
            let req = from_peer("203.0.113.7:40000", &format!("198.51.100.{}", i)).to_request();
            if actix_test::call_service(&app, req).await.status() == StatusCode::OK {
                succeeded += 1;
            }
        }

        assert_eq!(succeeded, 2);
        assert_eq!(limiters.tracked_keys(), 1);
    }

    #[actix_web::test]
    async fn test_trusted_proxy_forwards_client_address() {
        let proxy: IpAddr = "10.0.0.5".parse().unwrap();
        let limiters = Arc::new(RateLimiters::new(1, 1).with_trusted_proxies(vec![proxy]));
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(limiters))
                .wrap(from_fn(rate_limit))
                .route("/gear", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let first = from_peer("10.0.0.5:5000", "198.51.100.1").to_request();
        assert_eq!(actix_test::call_service(&app, first).await.status(), StatusCode::OK);

        let other_client = from_peer("10.0.0.5:5000", "198.51.100.2").to_request();
        assert_eq!(actix_test::call_service(&app, other_client).await.status(), StatusCode::OK);

        let repeat = from_peer("10.0.0.5:5000", "198.51.100.1").to_request();
        assert_eq!(
            actix_test::call_service(&app, repeat).await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
