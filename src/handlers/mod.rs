// src/handlers/mod.rs
// DOCUMENTATION: Handlers module organization
// PURPOSE: Re-export route configuration for main

pub mod admin;
pub mod dashboard;
pub mod disputes;
pub mod gear;
pub mod health;
pub mod messages;
pub mod payments;
pub mod rentals;
pub mod reviews;
pub mod users;

pub use admin::config as admin_config;
pub use dashboard::config as dashboard_config;
pub use gear::config as gear_config;
pub use health::config as health_config;
pub use messages::config as messages_config;
pub use payments::config as payments_config;
pub use rentals::config as rentals_config;
pub use reviews::config as reviews_config;
pub use users::config as users_config;
