//! Review domain model.
//!
//! # Invariants
//! - Each review belongs to exactly one location.
//! - `review_id` (the external id) is unique across the datastore.
//! - Ratings are persisted only when in `MIN_RATING..=MAX_RATING`; the
//!   datastore CHECK constraint rejects anything else.

use crate::model::location::LocationId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ReviewId = Uuid;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// One external rating/comment record, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub location_id: LocationId,
    /// Identifier assigned by the review platform.
    pub review_id: String,
    pub reviewer_name: String,
    /// Avatar URL.
    pub reviewer_profile_image: Option<String>,
    pub rating: u8,
    pub review_text: Option<String>,
    /// Unix epoch milliseconds.
    pub review_date: i64,
    /// Business owner's reply.
    pub response_text: Option<String>,
    pub response_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Review {
    pub fn has_response(&self) -> bool {
        self.response_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

/// Review record as delivered by the sync feed.
///
/// Field names follow the datastore columns so feed JSON maps directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub review_id: String,
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_profile_image: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub review_text: Option<String>,
    pub review_date: i64,
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub response_date: Option<i64>,
}

impl ReviewDraft {
    pub fn new(
        review_id: impl Into<String>,
        reviewer_name: impl Into<String>,
        rating: u8,
        review_date: i64,
    ) -> Self {
        Self {
            review_id: review_id.into(),
            reviewer_name: reviewer_name.into(),
            reviewer_profile_image: None,
            rating,
            review_text: None,
            review_date,
            response_text: None,
            response_date: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.review_text = Some(text.into());
        self
    }

    pub fn with_response(mut self, text: impl Into<String>, date: i64) -> Self {
        self.response_text = Some(text.into());
        self.response_date = Some(date);
        self
    }
}
