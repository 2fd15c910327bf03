//! Location user dashboard use-cases.
//!
//! # Responsibility
//! - Resolve the signed-in user's location and fetch its reviews.
//! - Compute statistics over the full review set and apply the view filter.
//!
//! # Invariants
//! - A user without a location gets `DashboardView::Unassigned`, not an error.
//! - Stats always describe every review of the location, independent of the
//!   active filter; only the list is filtered.

use crate::model::location::{Location, LocationId};
use crate::model::review::Review;
use crate::model::user::UserId;
use crate::repo::location_repo::LocationRepository;
use crate::repo::review_repo::{ReviewListQuery, ReviewRepository};
use crate::repo::RepoError;
use crate::service::filter::ReviewFilter;
use crate::service::stats::ReviewStats;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Guidance shown when no location is linked to the account.
pub const UNASSIGNED_GUIDANCE: &str =
    "No location is linked to your account yet. Ask an administrator to assign one.";

#[derive(Debug)]
pub enum DashboardError {
    LocationNotFound(LocationId),
    Repo(RepoError),
}

impl Display for DashboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DashboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::LocationNotFound(_) => None,
        }
    }
}

impl From<RepoError> for DashboardError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One location's review page.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationDashboard {
    pub location: Location,
    pub stats: ReviewStats,
    /// Reviews matching `filter`, newest first.
    pub reviews: Vec<Review>,
    pub filter: ReviewFilter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    Unassigned { guidance: &'static str },
    Assigned(Box<LocationDashboard>),
}

/// Read-only facade over location + review repositories.
pub struct DashboardService<L: LocationRepository, R: ReviewRepository> {
    locations: L,
    reviews: R,
}

impl<L: LocationRepository, R: ReviewRepository> DashboardService<L, R> {
    pub fn new(locations: L, reviews: R) -> Self {
        Self { locations, reviews }
    }

    /// Loads the dashboard of the location owned by `user_id`.
    pub fn load_for_user(
        &self,
        user_id: UserId,
        filter: &ReviewFilter,
    ) -> Result<DashboardView, DashboardError> {
        let Some(location) = self.locations.find_location_for_user(user_id)? else {
            info!("event=dashboard_load module=service status=ok state=unassigned user_id={user_id}");
            return Ok(DashboardView::Unassigned {
                guidance: UNASSIGNED_GUIDANCE,
            });
        };

        let dashboard = self.build(location, filter)?;
        Ok(DashboardView::Assigned(Box::new(dashboard)))
    }

    /// Loads any location visible to the caller (admin drill-down).
    pub fn load_location(
        &self,
        id: LocationId,
        filter: &ReviewFilter,
    ) -> Result<LocationDashboard, DashboardError> {
        let location = self
            .locations
            .get_location(id)?
            .ok_or(DashboardError::LocationNotFound(id))?;
        self.build(location, filter)
    }

    fn build(
        &self,
        location: Location,
        filter: &ReviewFilter,
    ) -> Result<LocationDashboard, DashboardError> {
        let all = self
            .reviews
            .list_reviews(&ReviewListQuery::for_location(location.id))?;
        let stats = ReviewStats::from_reviews(&all);
        let reviews = filter.apply(&all);

        info!(
            "event=dashboard_load module=service status=ok state=assigned location_id={} total={} shown={}",
            location.id,
            stats.total,
            reviews.len()
        );
        Ok(LocationDashboard {
            location,
            stats,
            reviews,
            filter: filter.clone(),
        })
    }
}
