//! Identity and session service.
//!
//! # Responsibility
//! - Register accounts and verify credentials.
//! - Issue, resolve and revoke bearer sessions carrying role claims.
//!
//! # Invariants
//! - Passwords are stored only as salted PBKDF2-HMAC-SHA256 keys.
//! - An expired session never resolves to claims.
//! - Emails and passwords are never written to logs.

mod password;
mod service;

pub use service::{
    AuthError, AuthResult, AuthService, Session, SessionClaims, DEFAULT_SESSION_TTL,
};
