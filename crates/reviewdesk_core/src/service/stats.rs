//! Aggregate rating statistics over a fetched review list.
//!
//! # Invariants
//! - `average_rating` is the arithmetic mean, `0.0` for an empty list.
//! - Bucket counts sum to `total` for any list of stored reviews.

use crate::model::review::{Review, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};

const BUCKETS: usize = (MAX_RATING - MIN_RATING + 1) as usize;

/// Count of reviews per rating value `1..=5`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingDistribution {
    counts: [usize; BUCKETS],
}

impl RatingDistribution {
    /// Returns the count for one rating value; out-of-range values count 0.
    pub fn count(&self, rating: u8) -> usize {
        bucket_index(rating).map_or(0, |index| self.counts[index])
    }

    /// Yields `(rating, count)` from 5 stars down to 1.
    pub fn iter_desc(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        (MIN_RATING..=MAX_RATING)
            .rev()
            .map(move |rating| (rating, self.count(rating)))
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    fn record(&mut self, rating: u8) {
        debug_assert!(
            (MIN_RATING..=MAX_RATING).contains(&rating),
            "rating {rating} outside {MIN_RATING}..={MAX_RATING}"
        );
        if let Some(index) = bucket_index(rating) {
            self.counts[index] += 1;
        }
    }
}

/// Summary figures shown above the review list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total: usize,
    pub average_rating: f64,
    pub distribution: RatingDistribution,
    /// Reviews that already carry a business response.
    pub responded: usize,
}

impl ReviewStats {
    pub fn from_reviews<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Self {
        let mut total = 0usize;
        let mut rating_sum = 0u64;
        let mut distribution = RatingDistribution::default();
        let mut responded = 0usize;

        for review in reviews {
            total += 1;
            rating_sum += u64::from(review.rating);
            distribution.record(review.rating);
            if review.has_response() {
                responded += 1;
            }
        }

        let average_rating = if total == 0 {
            0.0
        } else {
            rating_sum as f64 / total as f64
        };

        Self {
            total,
            average_rating,
            distribution,
            responded,
        }
    }

    /// Share of `rating` among all reviews, in percent (`0.0` when empty).
    pub fn percentage(&self, rating: u8) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.distribution.count(rating) as f64 * 100.0 / self.total as f64
    }
}

fn bucket_index(rating: u8) -> Option<usize> {
    (MIN_RATING..=MAX_RATING)
        .contains(&rating)
        .then(|| usize::from(rating - MIN_RATING))
}

#[cfg(test)]
mod tests {
    use super::ReviewStats;
    use crate::model::review::Review;
    use uuid::Uuid;

    fn review(rating: u8, response: Option<&str>) -> Review {
        Review {
            id: Uuid::new_v4(),
            location_id: Uuid::nil(),
            review_id: Uuid::new_v4().to_string(),
            reviewer_name: "Guest".to_string(),
            reviewer_profile_image: None,
            rating,
            review_text: None,
            review_date: 0,
            response_text: response.map(str::to_string),
            response_date: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn empty_list_has_zero_average_and_empty_buckets() {
        let stats = ReviewStats::from_reviews(&Vec::<Review>::new());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.average_rating, 0.0);
        assert_eq!(stats.distribution.total(), 0);
        assert_eq!(stats.percentage(5), 0.0);
    }

    #[test]
    fn average_is_arithmetic_mean() {
        let reviews = vec![review(5, None), review(4, None), review(1, None), review(4, None)];
        let stats = ReviewStats::from_reviews(&reviews);
        assert_eq!(stats.total, 4);
        assert!((stats.average_rating - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn buckets_sum_to_list_length_and_missing_buckets_are_zero() {
        let reviews = vec![review(5, None), review(5, None), review(2, None)];
        let stats = ReviewStats::from_reviews(&reviews);
        assert_eq!(stats.distribution.total(), reviews.len());
        assert_eq!(stats.distribution.count(5), 2);
        assert_eq!(stats.distribution.count(2), 1);
        assert_eq!(stats.distribution.count(3), 0);

        let desc: Vec<_> = stats.distribution.iter_desc().collect();
        assert_eq!(desc, vec![(5, 2), (4, 0), (3, 0), (2, 1), (1, 0)]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "outside 1..=5")]
    fn out_of_range_rating_is_flagged_in_debug_builds() {
        ReviewStats::from_reviews(&vec![review(0, None)]);
    }

    #[test]
    fn counts_only_non_blank_responses() {
        let reviews = vec![
            review(3, Some("Thanks for visiting!")),
            review(4, Some("   ")),
            review(2, None),
        ];
        let stats = ReviewStats::from_reviews(&reviews);
        assert_eq!(stats.responded, 1);
    }
}
