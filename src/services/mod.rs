// src/services/mod.rs
// DOCUMENTATION: Services module organization
// PURPOSE: Re-export service components

pub mod availability;
pub mod cache;
pub mod dispute_service;
pub mod gear_service;
pub mod message_service;
pub mod payment_service;
pub mod payments;
pub mod pricing;
pub mod rate_limiter;
pub mod realtime;
pub mod rental_service;
pub mod review_service;
pub mod stats_service;
pub mod user_service;

pub use cache::*;
pub use dispute_service::*;
pub use gear_service::*;
pub use message_service::*;
pub use payment_service::*;
pub use payments::{create_provider, PaymentProvider};
pub use rate_limiter::*;
pub use realtime::{create_publisher, RealtimePublisher};
pub use rental_service::*;
pub use review_service::*;
pub use stats_service::*;
pub use user_service::*;
