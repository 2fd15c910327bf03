//! Review repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Reads are narrowed to the caller's visible locations.
//! - Writes are reserved to the service caller (review sync).
//! - `review_id` is the natural key for upserts; a review never moves
//!   between locations.
//! - List ordering is deterministic: `review_date DESC, id ASC`.

use crate::model::location::LocationId;
use crate::model::review::{Review, ReviewDraft, ReviewId};
use crate::repo::policy::{can_write_reviews, review_read_scope, Caller};
use crate::repo::{parse_uuid_column, RepoError, RepoResult};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const REVIEW_SELECT_SQL: &str = "SELECT
    reviews.id AS id,
    reviews.location_id AS location_id,
    reviews.review_id AS review_id,
    reviews.reviewer_name AS reviewer_name,
    reviews.reviewer_profile_image AS reviewer_profile_image,
    reviews.rating AS rating,
    reviews.review_text AS review_text,
    reviews.review_date AS review_date,
    reviews.response_text AS response_text,
    reviews.response_date AS response_date,
    reviews.created_at AS created_at,
    reviews.updated_at AS updated_at
FROM reviews";

/// Query options for listing reviews.
#[derive(Debug, Clone, Default)]
pub struct ReviewListQuery {
    pub location_id: Option<LocationId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl ReviewListQuery {
    pub fn for_location(location_id: LocationId) -> Self {
        Self {
            location_id: Some(location_id),
            ..Self::default()
        }
    }
}

/// Result of a keyed review write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted(ReviewId),
    Updated(ReviewId),
}

impl UpsertOutcome {
    pub fn id(self) -> ReviewId {
        match self {
            Self::Inserted(id) | Self::Updated(id) => id,
        }
    }
}

/// Repository interface for review reads and sync writes.
pub trait ReviewRepository {
    fn list_reviews(&self, query: &ReviewListQuery) -> RepoResult<Vec<Review>>;
    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>>;
    fn count_reviews(&self, location_id: LocationId) -> RepoResult<u64>;
    fn upsert_review(&self, location_id: LocationId, draft: &ReviewDraft)
        -> RepoResult<UpsertOutcome>;
    fn delete_review(&self, id: ReviewId) -> RepoResult<()>;
}

/// SQLite-backed review repository bound to one caller.
pub struct SqliteReviewRepository<'conn> {
    conn: &'conn Connection,
    caller: Caller,
}

impl<'conn> SqliteReviewRepository<'conn> {
    pub fn new(conn: &'conn Connection, caller: Caller) -> Self {
        Self { conn, caller }
    }

    fn ensure_writable(&self, action: &'static str) -> RepoResult<()> {
        if can_write_reviews(&self.caller) {
            return Ok(());
        }
        warn!(
            "event=policy_denied module=repo status=error table=reviews action={action} caller={}",
            self.caller.label()
        );
        Err(RepoError::PermissionDenied {
            action,
            table: "reviews",
        })
    }
}

impl ReviewRepository for SqliteReviewRepository<'_> {
    fn list_reviews(&self, query: &ReviewListQuery) -> RepoResult<Vec<Review>> {
        let scope = review_read_scope(&self.caller);
        let mut sql = format!("{REVIEW_SELECT_SQL} WHERE ({})", scope.clause);
        let mut binds = scope.binds;

        if let Some(location_id) = query.location_id {
            sql.push_str(" AND reviews.location_id = ?");
            binds.push(Value::Text(location_id.to_string()));
        }

        sql.push_str(" ORDER BY reviews.review_date DESC, reviews.id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                binds.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            binds.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(parse_review_row(row)?);
        }
        Ok(reviews)
    }

    fn get_review(&self, id: ReviewId) -> RepoResult<Option<Review>> {
        let scope = review_read_scope(&self.caller);
        let sql = format!(
            "{REVIEW_SELECT_SQL} WHERE reviews.id = ? AND ({}) LIMIT 1;",
            scope.clause
        );
        let mut binds = vec![Value::Text(id.to_string())];
        binds.extend(scope.binds);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_review_row(row)?));
        }
        Ok(None)
    }

    fn count_reviews(&self, location_id: LocationId) -> RepoResult<u64> {
        let scope = review_read_scope(&self.caller);
        let sql = format!(
            "SELECT COUNT(*) FROM reviews WHERE reviews.location_id = ? AND ({});",
            scope.clause
        );
        let mut binds = vec![Value::Text(location_id.to_string())];
        binds.extend(scope.binds);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative review count {count}")))
    }

    fn upsert_review(
        &self,
        location_id: LocationId,
        draft: &ReviewDraft,
    ) -> RepoResult<UpsertOutcome> {
        self.ensure_writable("upsert")?;

        let existing = self
            .conn
            .query_row(
                "SELECT id, location_id FROM reviews WHERE review_id = ?1;",
                [draft.review_id.as_str()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((id_text, owner_text)) = existing else {
            let id = Uuid::new_v4();
            self.conn.execute(
                "INSERT INTO reviews (
                    id,
                    location_id,
                    review_id,
                    reviewer_name,
                    reviewer_profile_image,
                    rating,
                    review_text,
                    review_date,
                    response_text,
                    response_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    id.to_string(),
                    location_id.to_string(),
                    draft.review_id.as_str(),
                    draft.reviewer_name.as_str(),
                    draft.reviewer_profile_image.as_deref(),
                    i64::from(draft.rating),
                    draft.review_text.as_deref(),
                    draft.review_date,
                    draft.response_text.as_deref(),
                    draft.response_date,
                ],
            )?;
            return Ok(UpsertOutcome::Inserted(id));
        };

        if owner_text != location_id.to_string() {
            return Err(RepoError::Conflict(format!(
                "review `{}` already belongs to location {owner_text}",
                draft.review_id
            )));
        }
        let id = Uuid::parse_str(&id_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{id_text}` in reviews.id"))
        })?;

        self.conn.execute(
            "UPDATE reviews
             SET
                reviewer_name = ?1,
                reviewer_profile_image = ?2,
                rating = ?3,
                review_text = ?4,
                review_date = ?5,
                response_text = ?6,
                response_date = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?8;",
            params![
                draft.reviewer_name.as_str(),
                draft.reviewer_profile_image.as_deref(),
                i64::from(draft.rating),
                draft.review_text.as_deref(),
                draft.review_date,
                draft.response_text.as_deref(),
                draft.response_date,
                id.to_string(),
            ],
        )?;
        Ok(UpsertOutcome::Updated(id))
    }

    fn delete_review(&self, id: ReviewId) -> RepoResult<()> {
        self.ensure_writable("delete")?;

        let changed = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "review",
                id,
            });
        }
        Ok(())
    }
}

fn parse_review_row(row: &Row<'_>) -> RepoResult<Review> {
    Ok(Review {
        id: parse_uuid_column(row, "id", "reviews")?,
        location_id: parse_uuid_column(row, "location_id", "reviews")?,
        review_id: row.get("review_id")?,
        reviewer_name: row.get("reviewer_name")?,
        reviewer_profile_image: row.get("reviewer_profile_image")?,
        rating: row.get("rating")?,
        review_text: row.get("review_text")?,
        review_date: row.get("review_date")?,
        response_text: row.get("response_text")?,
        response_date: row.get("response_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
