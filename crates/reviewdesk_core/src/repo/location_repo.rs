//! Location repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Writes require a caller with location write policy (admin/service).
//! - Deleting a location cascades to its reviews (schema FK).
//! - List ordering is deterministic: `name ASC, id ASC`.

use crate::model::location::{Location, LocationDraft, LocationId};
use crate::model::user::UserId;
use crate::repo::policy::{can_write_locations, location_read_scope, Caller};
use crate::repo::{parse_optional_uuid_column, parse_uuid_column, RepoError, RepoResult};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const LOCATION_SELECT_SQL: &str = "SELECT
    locations.id AS id,
    locations.place_id AS place_id,
    locations.telegram_chat_id AS telegram_chat_id,
    locations.name AS name,
    locations.user_id AS user_id,
    locations.created_at AS created_at,
    locations.updated_at AS updated_at
FROM locations";

/// Query options for listing locations.
#[derive(Debug, Clone, Default)]
pub struct LocationListQuery {
    pub owner: Option<UserId>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for location CRUD operations.
pub trait LocationRepository {
    fn create_location(&self, draft: &LocationDraft) -> RepoResult<LocationId>;
    fn update_location(&self, id: LocationId, draft: &LocationDraft) -> RepoResult<()>;
    fn delete_location(&self, id: LocationId) -> RepoResult<()>;
    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>>;
    fn list_locations(&self, query: &LocationListQuery) -> RepoResult<Vec<Location>>;
    /// Returns the location owned by `user_id`, if visible to the caller.
    fn find_location_for_user(&self, user_id: UserId) -> RepoResult<Option<Location>>;
    fn find_location_by_place_id(&self, place_id: &str) -> RepoResult<Option<Location>>;
}

/// SQLite-backed location repository bound to one caller.
pub struct SqliteLocationRepository<'conn> {
    conn: &'conn Connection,
    caller: Caller,
}

impl<'conn> SqliteLocationRepository<'conn> {
    pub fn new(conn: &'conn Connection, caller: Caller) -> Self {
        Self { conn, caller }
    }

    fn ensure_writable(&self, action: &'static str) -> RepoResult<()> {
        if can_write_locations(&self.caller) {
            return Ok(());
        }
        warn!(
            "event=policy_denied module=repo status=error table=locations action={action} caller={}",
            self.caller.label()
        );
        Err(RepoError::PermissionDenied {
            action,
            table: "locations",
        })
    }

    fn query_locations(&self, sql: &str, binds: Vec<Value>) -> RepoResult<Vec<Location>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut locations = Vec::new();
        while let Some(row) = rows.next()? {
            locations.push(parse_location_row(row)?);
        }
        Ok(locations)
    }
}

impl LocationRepository for SqliteLocationRepository<'_> {
    fn create_location(&self, draft: &LocationDraft) -> RepoResult<LocationId> {
        self.ensure_writable("insert")?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO locations (id, place_id, telegram_chat_id, name, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                draft.place_id.as_str(),
                draft.telegram_chat_id.as_str(),
                draft.name.as_str(),
                draft.user_id.map(|user_id| user_id.to_string()),
            ],
        )?;

        Ok(id)
    }

    fn update_location(&self, id: LocationId, draft: &LocationDraft) -> RepoResult<()> {
        self.ensure_writable("update")?;

        let changed = self.conn.execute(
            "UPDATE locations
             SET
                place_id = ?1,
                telegram_chat_id = ?2,
                name = ?3,
                user_id = ?4,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?5;",
            params![
                draft.place_id.as_str(),
                draft.telegram_chat_id.as_str(),
                draft.name.as_str(),
                draft.user_id.map(|user_id| user_id.to_string()),
                id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "location",
                id,
            });
        }
        Ok(())
    }

    fn delete_location(&self, id: LocationId) -> RepoResult<()> {
        self.ensure_writable("delete")?;

        let changed = self
            .conn
            .execute("DELETE FROM locations WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "location",
                id,
            });
        }
        Ok(())
    }

    fn get_location(&self, id: LocationId) -> RepoResult<Option<Location>> {
        let scope = location_read_scope(&self.caller);
        let sql = format!(
            "{LOCATION_SELECT_SQL} WHERE locations.id = ? AND ({}) LIMIT 1;",
            scope.clause
        );
        let mut binds = vec![Value::Text(id.to_string())];
        binds.extend(scope.binds);
        Ok(self.query_locations(&sql, binds)?.into_iter().next())
    }

    fn list_locations(&self, query: &LocationListQuery) -> RepoResult<Vec<Location>> {
        let scope = location_read_scope(&self.caller);
        let mut sql = format!("{LOCATION_SELECT_SQL} WHERE ({})", scope.clause);
        let mut binds = scope.binds;

        if let Some(owner) = query.owner {
            sql.push_str(" AND locations.user_id = ?");
            binds.push(Value::Text(owner.to_string()));
        }

        sql.push_str(" ORDER BY locations.name ASC, locations.id ASC");

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

        self.query_locations(&sql, binds)
    }

    fn find_location_for_user(&self, user_id: UserId) -> RepoResult<Option<Location>> {
        let query = LocationListQuery {
            owner: Some(user_id),
            limit: Some(1),
            offset: 0,
        };
        Ok(self.list_locations(&query)?.into_iter().next())
    }

    fn find_location_by_place_id(&self, place_id: &str) -> RepoResult<Option<Location>> {
        let scope = location_read_scope(&self.caller);
        let sql = format!(
            "{LOCATION_SELECT_SQL} WHERE locations.place_id = ? AND ({}) LIMIT 1;",
            scope.clause
        );
        let mut binds = vec![Value::Text(place_id.trim().to_string())];
        binds.extend(scope.binds);
        Ok(self.query_locations(&sql, binds)?.into_iter().next())
    }
}

fn parse_location_row(row: &Row<'_>) -> RepoResult<Location> {
    Ok(Location {
        id: parse_uuid_column(row, "id", "locations")?,
        place_id: row.get("place_id")?,
        telegram_chat_id: row.get("telegram_chat_id")?,
        name: row.get("name")?,
        user_id: parse_optional_uuid_column(row, "user_id", "locations")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
