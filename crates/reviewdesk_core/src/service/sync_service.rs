//! Review sync ingestion.
//!
//! # Responsibility
//! - Upsert a batch of platform reviews for one location, keyed by the
//!   external review id.
//!
//! # Invariants
//! - Runs as the service caller; user sessions can never write reviews.
//! - A batch is atomic: one rejected row (e.g. rating outside 1..=5) rolls
//!   back every write of that batch.

use crate::model::location::LocationId;
use crate::model::review::ReviewDraft;
use crate::repo::location_repo::{LocationRepository, SqliteLocationRepository};
use crate::repo::policy::Caller;
use crate::repo::review_repo::{ReviewRepository, SqliteReviewRepository, UpsertOutcome};
use crate::repo::RepoError;
use log::{error, info};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum SyncError {
    UnknownPlace(String),
    LocationNotFound(LocationId),
    /// The datastore refused one review of the batch.
    Rejected {
        review_id: String,
        source: RepoError,
    },
    Repo(RepoError),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPlace(place_id) => write!(f, "no location tracks place id `{place_id}`"),
            Self::LocationNotFound(id) => write!(f, "location not found: {id}"),
            Self::Rejected { review_id, source } => {
                write!(f, "review `{review_id}` rejected: {source}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected { source, .. } => Some(source),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SyncError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// Outcome of one committed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub location_id: LocationId,
    pub inserted: usize,
    pub updated: usize,
}

pub struct ReviewSyncService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ReviewSyncService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Syncs a batch for the location tracking `place_id`.
    pub fn sync_place(
        &self,
        place_id: &str,
        drafts: &[ReviewDraft],
    ) -> Result<SyncReport, SyncError> {
        let location = SqliteLocationRepository::new(self.conn, Caller::Service)
            .find_location_by_place_id(place_id)?
            .ok_or_else(|| SyncError::UnknownPlace(place_id.trim().to_string()))?;
        self.sync_location(location.id, drafts)
    }

    /// Syncs a batch for one location inside a single transaction.
    pub fn sync_location(
        &self,
        location_id: LocationId,
        drafts: &[ReviewDraft],
    ) -> Result<SyncReport, SyncError> {
        let started_at = Instant::now();
        let tx = self.conn.unchecked_transaction()?;

        let locations = SqliteLocationRepository::new(&tx, Caller::Service);
        if locations.get_location(location_id)?.is_none() {
            return Err(SyncError::LocationNotFound(location_id));
        }

        let reviews = SqliteReviewRepository::new(&tx, Caller::Service);
        let mut report = SyncReport {
            location_id,
            inserted: 0,
            updated: 0,
        };
        for draft in drafts {
            match reviews.upsert_review(location_id, draft) {
                Ok(UpsertOutcome::Inserted(_)) => report.inserted += 1,
                Ok(UpsertOutcome::Updated(_)) => report.updated += 1,
                Err(err) => {
                    error!(
                        "event=review_sync module=service status=error location_id={location_id} batch_size={} error={}",
                        drafts.len(),
                        err
                    );
                    return Err(SyncError::Rejected {
                        review_id: draft.review_id.clone(),
                        source: err,
                    });
                }
            }
        }
        tx.commit()?;

        info!(
            "event=review_sync module=service status=ok location_id={location_id} inserted={} updated={} duration_ms={}",
            report.inserted,
            report.updated,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}
