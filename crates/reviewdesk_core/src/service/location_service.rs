//! Location administration use-cases.
//!
//! # Responsibility
//! - Back the admin screen: list, create, edit, delete, assign owner.
//! - Validate form input before delegating to the repository.
//!
//! # Invariants
//! - Drafts are normalized (trimmed) before any write.
//! - Duplicate place ids surface as `PlaceIdTaken`, not a raw DB error.

use crate::model::location::{Location, LocationDraft, LocationId, LocationValidationError};
use crate::model::user::UserId;
use crate::repo::location_repo::{LocationListQuery, LocationRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum LocationServiceError {
    Validation(LocationValidationError),
    LocationNotFound(LocationId),
    PlaceIdTaken(String),
    Repo(RepoError),
}

impl Display for LocationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::PlaceIdTaken(place_id) => {
                write!(f, "a location with place id `{place_id}` already exists")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LocationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LocationValidationError> for LocationServiceError {
    fn from(value: LocationValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for LocationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { id, .. } => Self::LocationNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type LocationServiceResult<T> = Result<T, LocationServiceError>;

/// Admin facade over a location repository.
pub struct LocationService<R: LocationRepository> {
    repo: R,
}

impl<R: LocationRepository> LocationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists every location visible to the repository's caller, by name.
    pub fn list_locations(&self) -> LocationServiceResult<Vec<Location>> {
        Ok(self.repo.list_locations(&LocationListQuery::default())?)
    }

    pub fn get_location(&self, id: LocationId) -> LocationServiceResult<Location> {
        self.repo
            .get_location(id)?
            .ok_or(LocationServiceError::LocationNotFound(id))
    }

    pub fn create_location(&self, draft: &LocationDraft) -> LocationServiceResult<Location> {
        let draft = draft.normalized()?;
        let id = self
            .repo
            .create_location(&draft)
            .map_err(|err| place_conflict(err, &draft.place_id))?;
        info!("event=location_create module=service status=ok location_id={id}");
        self.get_location(id)
    }

    /// Replaces every editable field of a location.
    pub fn update_location(
        &self,
        id: LocationId,
        draft: &LocationDraft,
    ) -> LocationServiceResult<Location> {
        let draft = draft.normalized()?;
        self.repo
            .update_location(id, &draft)
            .map_err(|err| place_conflict(err, &draft.place_id))?;
        info!("event=location_update module=service status=ok location_id={id}");
        self.get_location(id)
    }

    /// Deletes a location together with all of its reviews.
    pub fn delete_location(&self, id: LocationId) -> LocationServiceResult<()> {
        self.repo.delete_location(id)?;
        info!("event=location_delete module=service status=ok location_id={id}");
        Ok(())
    }

    /// Links (or unlinks, with `None`) the account that may view a location.
    pub fn assign_owner(
        &self,
        id: LocationId,
        owner: Option<UserId>,
    ) -> LocationServiceResult<Location> {
        let current = self.get_location(id)?;
        let draft = LocationDraft {
            name: current.name,
            place_id: current.place_id,
            telegram_chat_id: current.telegram_chat_id,
            user_id: owner,
        };
        self.update_location(id, &draft)
    }
}

fn place_conflict(err: RepoError, place_id: &str) -> LocationServiceError {
    match err {
        RepoError::Conflict(_) => LocationServiceError::PlaceIdTaken(place_id.to_string()),
        other => other.into(),
    }
}
