// src/main.rs
// DOCUMENTATION: Application entry point
// PURPOSE: Initialize config, database, shared services and start HTTP server

mod auth;
mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod services;

use actix_web::{middleware::from_fn, middleware::Logger, web, App, HttpServer};
use config::Config;
use dotenv::dotenv;
use services::{
    create_provider, create_publisher, rate_limit, start_cleanup_task, start_limiter_cleanup_task,
    RateLimiters, ResponseCache,
};
use std::io;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // 1. Load environment variables
    dotenv().ok();

    // 2. Load configuration
    let config = Config::from_env();
    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    // 3. Initialize logging
    if std::env::var("RUST_LOG").is_err() {
        let log_level = if !config.log_level.is_empty() {
            &config.log_level
        } else {
            "info,actix_web=info,sqlx=warn"
        };
        std::env::set_var("RUST_LOG", log_level);
    }
    env_logger::init();

    log::info!("Starting gearshare marketplace API...");
    log::info!("Environment: {}", config.environment);
    log::info!(
        "Server Address: {}:{}",
        config.server_address,
        config.server_port
    );

    // 4. Initialize database connection pool
    let pool = match config::init_db_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    // 5. Response cache for search results and dashboards
    let cache = Arc::new(ResponseCache::new(config.cache_ttl_seconds));
    start_cleanup_task(cache.clone(), 300);
    log::info!("Initialized response cache (TTL: {}s)", config.cache_ttl_seconds);

    // 6. Rate limiters
    let limiters = Arc::new(
        RateLimiters::new(config.rate_limit_per_minute, config.write_rate_limit_per_minute)
            .with_trusted_proxies(config.trusted_proxies.clone()),
    );
    start_limiter_cleanup_task(limiters.clone(), 600);

    // 7. External integrations
    let provider = create_provider(&config);
    let publisher = create_publisher(&config);
    log::info!("Payment provider: {}", provider.name());

    if config.admin_token.is_empty() {
        log::info!("ADMIN_TOKEN is not set; admin endpoints disabled");
    }

    // 8. Start HTTP server
    let server_addr = format!("{}:{}", config.server_address, config.server_port);
    let config_clone = config.clone();

    HttpServer::new(move || {
        App::new()
            // Application state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config_clone.clone()))
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(limiters.clone()))
            .app_data(web::Data::new(provider.clone()))
            .app_data(web::Data::new(publisher.clone()))
            // Middleware
            .wrap(from_fn(rate_limit))
            .wrap(Logger::default())
            .wrap(actix_web::middleware::Compress::default())
            // Routes
            .configure(handlers::health_config)
            .configure(handlers::users_config)
            .configure(handlers::gear_config)
            .configure(handlers::rentals_config)
            .configure(handlers::payments_config)
            .configure(handlers::reviews_config)
            .configure(handlers::messages_config)
            .configure(handlers::dashboard_config)
            .configure(handlers::admin_config)
    })
    .bind(&server_addr)?
    .run()
    .await
}
