//! Row-level access policy for the review datastore.
//!
//! Every repository statement is narrowed by a predicate derived from the
//! [`Caller`], the same way a hosted datastore applies its row policies to a
//! request carrying a signed session.
//!
//! | caller  | locations        | reviews                         |
//! |---------|------------------|---------------------------------|
//! | service | read/write all   | read/write all                  |
//! | admin   | read/write all   | read all                        |
//! | user    | read owned only  | read reviews of owned location  |

use crate::auth::SessionClaims;
use crate::model::user::{Role, UserId};
use rusqlite::types::Value;

/// Identity a repository acts on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// Trusted backend job (review sync). Bypasses row policies.
    Service,
    Admin(UserId),
    User(UserId),
}

impl Caller {
    pub fn from_claims(claims: &SessionClaims) -> Self {
        match claims.role {
            Role::Admin => Self::Admin(claims.sub),
            Role::User => Self::User(claims.sub),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Service => None,
            Self::Admin(id) | Self::User(id) => Some(*id),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    /// Stable label for log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Admin(_) => "admin",
            Self::User(_) => "user",
        }
    }
}

/// SQL predicate plus its positional bind values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scope {
    pub clause: &'static str,
    pub binds: Vec<Value>,
}

impl Scope {
    fn unrestricted() -> Self {
        Self {
            clause: "1 = 1",
            binds: Vec::new(),
        }
    }
}

pub(crate) fn location_read_scope(caller: &Caller) -> Scope {
    match caller {
        Caller::Service | Caller::Admin(_) => Scope::unrestricted(),
        Caller::User(id) => Scope {
            clause: "locations.user_id = ?",
            binds: vec![Value::Text(id.to_string())],
        },
    }
}

pub(crate) fn review_read_scope(caller: &Caller) -> Scope {
    match caller {
        Caller::Service | Caller::Admin(_) => Scope::unrestricted(),
        Caller::User(id) => Scope {
            clause: "reviews.location_id IN (SELECT id FROM locations WHERE user_id = ?)",
            binds: vec![Value::Text(id.to_string())],
        },
    }
}

pub(crate) fn can_write_locations(caller: &Caller) -> bool {
    matches!(caller, Caller::Service | Caller::Admin(_))
}

pub(crate) fn can_write_reviews(caller: &Caller) -> bool {
    matches!(caller, Caller::Service)
}

#[cfg(test)]
mod tests {
    use super::{
        can_write_locations, can_write_reviews, location_read_scope, review_read_scope, Caller,
    };
    use crate::auth::SessionClaims;
    use crate::model::user::Role;
    use uuid::Uuid;

    #[test]
    fn caller_follows_role_claim() {
        let sub = Uuid::new_v4();
        let claims = SessionClaims {
            sub,
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            exp: 0,
        };
        assert_eq!(Caller::from_claims(&claims), Caller::Admin(sub));

        let claims = SessionClaims {
            role: Role::User,
            ..claims
        };
        assert_eq!(Caller::from_claims(&claims), Caller::User(sub));
    }

    #[test]
    fn user_scopes_bind_the_caller_identity() {
        let id = Uuid::new_v4();
        let scope = location_read_scope(&Caller::User(id));
        assert_eq!(scope.binds.len(), 1);
        assert!(scope.clause.contains("user_id"));

        let scope = review_read_scope(&Caller::User(id));
        assert!(scope.clause.contains("SELECT id FROM locations"));
    }

    #[test]
    fn only_service_writes_reviews() {
        let id = Uuid::new_v4();
        assert!(can_write_reviews(&Caller::Service));
        assert!(!can_write_reviews(&Caller::Admin(id)));
        assert!(!can_write_reviews(&Caller::User(id)));
        assert!(can_write_locations(&Caller::Admin(id)));
        assert!(!can_write_locations(&Caller::User(id)));
    }
}
