//! Core domain logic for ReviewDesk.
//! This crate owns the review datastore, its access policy and the
//! dashboard computations; UI surfaces call into it.

pub mod auth;
pub mod config;
pub mod db;
pub mod feedback;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::{AuthError, AuthService, Session, SessionClaims};
pub use config::DeskConfig;
pub use feedback::{report_failure, UserMessage, GENERIC_FAILURE_MESSAGE};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::location::{Location, LocationDraft, LocationId, LocationValidationError};
pub use model::review::{Review, ReviewDraft, ReviewId, MAX_RATING, MIN_RATING};
pub use model::user::{Role, User, UserId};
pub use repo::location_repo::{LocationListQuery, LocationRepository, SqliteLocationRepository};
pub use repo::policy::Caller;
pub use repo::review_repo::{
    ReviewListQuery, ReviewRepository, SqliteReviewRepository, UpsertOutcome,
};
pub use repo::{RepoError, RepoResult};
pub use service::dashboard_service::{
    DashboardError, DashboardService, DashboardView, LocationDashboard, UNASSIGNED_GUIDANCE,
};
pub use service::filter::ReviewFilter;
pub use service::location_service::{LocationService, LocationServiceError};
pub use service::stats::{RatingDistribution, ReviewStats};
pub use service::sync_service::{ReviewSyncService, SyncError, SyncReport};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
