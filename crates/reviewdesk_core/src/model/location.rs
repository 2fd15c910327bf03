//! Location domain model.
//!
//! # Responsibility
//! - Define the business location record tracked for review aggregation.
//! - Validate admin form input before it reaches the datastore.
//!
//! # Invariants
//! - `place_id` is globally unique (enforced by the datastore).
//! - `user_id = None` means the location is not assigned to anyone yet.

use crate::model::user::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type LocationId = Uuid;

static PLACE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid place id regex"));
static TELEGRAM_CHAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?[0-9]+|@[A-Za-z][A-Za-z0-9_]{4,31})$").expect("valid chat id regex")
});

/// Physical business location, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    /// Google Place ID.
    pub place_id: String,
    /// Notification channel for new-review alerts.
    pub telegram_chat_id: String,
    pub name: String,
    pub user_id: Option<UserId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Location {
    pub fn is_assigned(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Create/update form payload for a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDraft {
    pub name: String,
    pub place_id: String,
    pub telegram_chat_id: String,
    pub user_id: Option<UserId>,
}

impl LocationDraft {
    pub fn new(
        name: impl Into<String>,
        place_id: impl Into<String>,
        telegram_chat_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            place_id: place_id.into(),
            telegram_chat_id: telegram_chat_id.into(),
            user_id: None,
        }
    }

    pub fn with_owner(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Returns a trimmed copy, or the first field that fails validation.
    ///
    /// # Errors
    /// - `EmptyName` / `EmptyPlaceId` for blank inputs.
    /// - `InvalidPlaceId` when the id has characters outside `[A-Za-z0-9_-]`.
    /// - `InvalidTelegramChatId` unless it is a numeric chat id or `@handle`.
    pub fn normalized(&self) -> Result<Self, LocationValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LocationValidationError::EmptyName);
        }

        let place_id = self.place_id.trim();
        if place_id.is_empty() {
            return Err(LocationValidationError::EmptyPlaceId);
        }
        if !PLACE_ID_RE.is_match(place_id) {
            return Err(LocationValidationError::InvalidPlaceId(place_id.to_string()));
        }

        let chat_id = self.telegram_chat_id.trim();
        if !TELEGRAM_CHAT_RE.is_match(chat_id) {
            return Err(LocationValidationError::InvalidTelegramChatId(
                chat_id.to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            place_id: place_id.to_string(),
            telegram_chat_id: chat_id.to_string(),
            user_id: self.user_id,
        })
    }
}

/// Form validation failures for [`LocationDraft`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationValidationError {
    EmptyName,
    EmptyPlaceId,
    InvalidPlaceId(String),
    InvalidTelegramChatId(String),
}

impl Display for LocationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "location name must not be empty"),
            Self::EmptyPlaceId => write!(f, "place id must not be empty"),
            Self::InvalidPlaceId(value) => write!(f, "place id is malformed: `{value}`"),
            Self::InvalidTelegramChatId(value) => {
                write!(f, "telegram chat id must be numeric or an @handle: `{value}`")
            }
        }
    }
}

impl Error for LocationValidationError {}
