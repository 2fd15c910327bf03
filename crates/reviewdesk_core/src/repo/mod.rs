//! Datastore access layer: repositories bound to a calling identity.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for locations/reviews.
//! - Compose access-policy predicates into every statement (see [`policy`]).
//! - Translate engine failures into semantic errors (conflict, constraint,
//!   permission, not-found).
//!
//! # Invariants
//! - Reads outside the caller's policy return no rows, never an error.
//! - Writes outside the caller's policy fail with `PermissionDenied`.
//! - Rating range is enforced by the schema, not pre-checked here.

use crate::db::DbError;
use rusqlite::{ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod location_repo;
pub mod policy;
pub mod review_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by location and review persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    PermissionDenied {
        action: &'static str,
        table: &'static str,
    },
    /// Unique key collision (e.g. duplicate place id).
    Conflict(String),
    /// CHECK or foreign-key rejection.
    ConstraintViolation(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::PermissionDenied { action, table } => {
                write!(f, "permission denied: {action} on {table}")
            }
            Self::Conflict(detail) => write!(f, "conflicting record: {detail}"),
            Self::ConstraintViolation(detail) => write!(f, "constraint violated: {detail}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, message) = &value {
            if failure.code == ErrorCode::ConstraintViolation {
                let detail = message.clone().unwrap_or_else(|| value.to_string());
                return match failure.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Self::Conflict(detail),
                    _ => Self::ConstraintViolation(detail),
                };
            }
        }
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn parse_uuid_column(
    row: &Row<'_>,
    column: &str,
    table: &str,
) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
    })
}

pub(crate) fn parse_optional_uuid_column(
    row: &Row<'_>,
    column: &str,
    table: &str,
) -> RepoResult<Option<Uuid>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => Uuid::parse_str(&text).map(Some).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}.{column}"))
        }),
        None => Ok(None),
    }
}
