//! Use-case services behind the dashboard and admin screens.
//!
//! # Responsibility
//! - Orchestrate repository calls into screen-level operations.
//! - Own the client-side computations: rating statistics and list filter.

pub mod dashboard_service;
pub mod filter;
pub mod location_service;
pub mod stats;
pub mod sync_service;
