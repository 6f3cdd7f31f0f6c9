// src/models/mod.rs
// DOCUMENTATION: Models module organization
// PURPOSE: Re-export model components

pub mod dispute;
pub mod gear;
pub mod message;
pub mod rental;
pub mod review;
pub mod stats;
pub mod user;

pub use dispute::*;
pub use gear::*;
pub use message::*;
pub use rental::*;
pub use review::*;
pub use stats::*;
pub use user::*;
