//! SQLite-backed account and session store.

use super::password::{digest_new, verify};
use crate::db::DbError;
use crate::model::user::{Role, User, UserId};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Session lifetime used when callers do not configure one.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const MIN_PASSWORD_CHARS: usize = 8;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug)]
pub enum AuthError {
    InvalidEmail,
    WeakPassword { min_chars: usize },
    EmailTaken,
    /// Unknown email or wrong password; deliberately indistinguishable.
    InvalidCredentials,
    SessionNotFound,
    SessionExpired,
    Db(DbError),
    InvalidData(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "email address is malformed"),
            Self::WeakPassword { min_chars } => {
                write!(f, "password must be at least {min_chars} characters")
            }
            Self::EmailTaken => write!(f, "an account with this email already exists"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::SessionNotFound => write!(f, "session not found"),
            Self::SessionExpired => write!(f, "session expired"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted identity data: {message}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for AuthError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Claims resolved from a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: the signed-in user.
    pub sub: UserId,
    pub email: String,
    pub role: Role,
    /// Expiry in Unix epoch milliseconds.
    pub exp: i64,
}

impl SessionClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Bearer token plus the claims it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub claims: SessionClaims,
}

/// Account/session operations over the identity tables.
pub struct AuthService<'conn> {
    conn: &'conn Connection,
    session_ttl: Duration,
}

impl<'conn> AuthService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// - `InvalidEmail`, `WeakPassword` for rejected input.
    /// - `EmailTaken` when the email exists (case-insensitive).
    pub fn sign_up(&self, email: &str, password: &str, role: Role) -> AuthResult<User> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::WeakPassword {
                min_chars: MIN_PASSWORD_CHARS,
            });
        }

        let id = Uuid::new_v4();
        let digest = digest_new(password);
        let inserted = self.conn.execute(
            "INSERT INTO users (id, email, password_hash, password_salt, role)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(email) DO NOTHING;",
            params![
                id.to_string(),
                email.as_str(),
                digest.hash,
                digest.salt,
                role.as_str()
            ],
        )?;
        if inserted == 0 {
            return Err(AuthError::EmailTaken);
        }

        info!(
            "event=auth_sign_up module=auth status=ok user_id={id} role={}",
            role.as_str()
        );
        self.get_user(id)?
            .ok_or_else(|| AuthError::InvalidData(format!("user {id} missing after insert")))
    }

    /// Verifies credentials and opens a new session.
    pub fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let record = self
            .conn
            .query_row(
                "SELECT id, email, password_hash, password_salt, role, created_at
                 FROM users WHERE email = ?1;",
                [email.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>("password_hash")?,
                        row.get::<_, String>("password_salt")?,
                        parse_user_row(row),
                    ))
                },
            )
            .optional()?;

        let Some((hash, salt, user)) = record else {
            warn!("event=auth_sign_in module=auth status=error error_code=unknown_account");
            return Err(AuthError::InvalidCredentials);
        };
        let user = user?;
        if !verify(password, &salt, &hash) {
            warn!(
                "event=auth_sign_in module=auth status=error error_code=bad_password user_id={}",
                user.id
            );
            return Err(AuthError::InvalidCredentials);
        }

        let token = new_session_token();
        let expires_at = now_epoch_ms().saturating_add(duration_ms(self.session_ttl));
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3);",
            params![token.as_str(), user.id.to_string(), expires_at],
        )?;

        info!(
            "event=auth_sign_in module=auth status=ok user_id={} role={}",
            user.id,
            user.role.as_str()
        );
        Ok(Session {
            token,
            claims: SessionClaims {
                sub: user.id,
                email: user.email,
                role: user.role,
                exp: expires_at,
            },
        })
    }

    /// Resolves a bearer token into claims.
    ///
    /// Expired sessions are purged on sight.
    pub fn resolve(&self, token: &str) -> AuthResult<SessionClaims> {
        let row = self
            .conn
            .query_row(
                "SELECT users.id AS id, users.email AS email, users.role AS role,
                        users.created_at AS created_at, sessions.expires_at AS expires_at
                 FROM sessions
                 JOIN users ON users.id = sessions.user_id
                 WHERE sessions.token = ?1;",
                [token.trim()],
                |row| Ok((parse_user_row(row), row.get::<_, i64>("expires_at")?)),
            )
            .optional()?;

        let Some((user, expires_at)) = row else {
            return Err(AuthError::SessionNotFound);
        };
        if expires_at <= now_epoch_ms() {
            self.conn
                .execute("DELETE FROM sessions WHERE token = ?1;", [token.trim()])?;
            return Err(AuthError::SessionExpired);
        }

        let user = user?;
        Ok(SessionClaims {
            sub: user.id,
            email: user.email,
            role: user.role,
            exp: expires_at,
        })
    }

    /// Revokes a session. Unknown tokens are ignored.
    pub fn sign_out(&self, token: &str) -> AuthResult<()> {
        let removed = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1;", [token.trim()])?;
        info!("event=auth_sign_out module=auth status=ok revoked={removed}");
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> AuthResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, email, role, created_at FROM users WHERE id = ?1;",
                [id.to_string()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }

    pub fn find_user_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let email = normalize_email(email)?;
        let user = self
            .conn
            .query_row(
                "SELECT id, email, role, created_at FROM users WHERE email = ?1;",
                [email.as_str()],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }

    /// Lists accounts ordered by email.
    pub fn list_users(&self) -> AuthResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, email, role, created_at FROM users ORDER BY email ASC;")?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> AuthResult<User> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| AuthError::InvalidData(format!("invalid uuid `{id_text}` in users.id")))?;
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text)
        .ok_or_else(|| AuthError::InvalidData(format!("invalid role `{role_text}` in users.role")))?;

    Ok(User {
        id,
        email: row.get("email")?,
        role,
        created_at: row.get("created_at")?,
    })
}

fn normalize_email(email: &str) -> AuthResult<String> {
    let trimmed = email.trim();
    if !EMAIL_RE.is_match(trimmed) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn duration_ms(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

pub(crate) fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(duration_ms)
        .unwrap_or(0)
}
