// src/handlers/admin.rs
// DOCUMENTATION: Admin endpoints
// PURPOSE: Platform statistics and dispute resolution
// SECURITY: All routes require the X-Admin-Token header

use crate::auth::verify_admin_token;
use crate::config::Config;
use crate::errors::MarketplaceError;
use crate::handlers::disputes;
use crate::services::{ResponseCache, StatsService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// GET /admin/stats
/// Platform-wide counts
pub async fn platform_stats(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    cache: web::Data<Arc<ResponseCache>>,
    req: HttpRequest,
) -> Result<impl Responder, MarketplaceError> {
    verify_admin_token(&req, &config)?;

    let stats = StatsService::platform(pool.get_ref()).await?;
    let cache_stats = cache.stats().await;

    Ok(HttpResponse::Ok().json(json!({
        "platform": stats,
        "cache": cache_stats
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/stats", web::get().to(platform_stats))
            .route("/disputes/{id}/resolve", web::post().to(disputes::resolve_dispute)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support;
    use actix_web::{http::StatusCode, test, App};
    use uuid::Uuid;

    #[actix_web::test]
    async fn test_admin_token_required() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/admin/stats").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/admin/stats")
            .insert_header(("X-Admin-Token", "nope"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let uri = format!("/admin/disputes/{}/resolve", Uuid::new_v4());
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("X-Admin-Token", "nope"))
            .set_json(json!({ "status": "resolved", "resolution": "Deposit returned" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_resolve_must_close_dispute() {
        let app = test::init_service(
            App::new()
                .configure(test_support::app_state)
                .configure(config),
        )
        .await;

        let uri = format!("/admin/disputes/{}/resolve", Uuid::new_v4());
        let req = test::TestRequest::post()
            .uri(&uri)
            .insert_header(("X-Admin-Token", "admin-secret"))
            .set_json(json!({ "status": "open", "resolution": "still looking" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }
}
