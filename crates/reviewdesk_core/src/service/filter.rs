//! Client-side search and rating filter over a fetched review list.
//!
//! # Invariants
//! - Text matches reviewer name OR review text, case-insensitively.
//! - Rating filter is an exact match; both predicates combine with AND.
//! - An empty query matches every review.

use crate::model::review::Review;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFilter {
    pub query: String,
    pub rating: Option<u8>,
}

impl ReviewFilter {
    pub fn new(query: impl Into<String>, rating: Option<u8>) -> Self {
        Self {
            query: query.into(),
            rating,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_empty() && self.rating.is_none()
    }

    pub fn matches(&self, review: &Review) -> bool {
        if let Some(rating) = self.rating {
            if review.rating != rating {
                return false;
            }
        }
        if self.query.is_empty() {
            return true;
        }

        let needle = self.query.to_lowercase();
        review.reviewer_name.to_lowercase().contains(&needle)
            || review
                .review_text
                .as_deref()
                .is_some_and(|text| text.to_lowercase().contains(&needle))
    }

    /// Returns matching reviews, preserving input order.
    pub fn apply(&self, reviews: &[Review]) -> Vec<Review> {
        if self.is_empty() {
            return reviews.to_vec();
        }
        reviews
            .iter()
            .filter(|review| self.matches(review))
            .cloned()
            .collect()
    }
}
