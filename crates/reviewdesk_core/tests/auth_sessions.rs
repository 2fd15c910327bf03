use reviewdesk_core::db::open_db_in_memory;
use reviewdesk_core::{AuthError, AuthService, Role};
use std::time::Duration;

#[test]
fn sign_in_issues_session_with_role_claim() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);

    let admin = auth
        .sign_up("Admin@Example.com", "admin-password", Role::Admin)
        .unwrap();
    assert_eq!(admin.email, "admin@example.com");

    let session = auth.sign_in("admin@example.com", "admin-password").unwrap();
    assert_eq!(session.claims.sub, admin.id);
    assert!(session.claims.is_admin());

    let resolved = auth.resolve(&session.token).unwrap();
    assert_eq!(resolved, session.claims);
}

#[test]
fn claims_serialize_role_as_lowercase_string() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);
    auth.sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();
    let session = auth.sign_in("owner@example.com", "owner-password").unwrap();

    let json = serde_json::to_value(&session.claims).unwrap();
    assert_eq!(json["role"], "user");
    assert_eq!(json["email"], "owner@example.com");
}

#[test]
fn wrong_password_and_unknown_email_look_the_same() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);
    auth.sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();

    assert!(matches!(
        auth.sign_in("owner@example.com", "not-the-password"),
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.sign_in("nobody@example.com", "owner-password"),
        Err(AuthError::InvalidCredentials)
    ));
}

#[test]
fn duplicate_email_is_rejected_case_insensitively() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);
    auth.sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();

    let err = auth
        .sign_up("OWNER@example.com", "other-password", Role::User)
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[test]
fn sign_up_validates_input() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);

    assert!(matches!(
        auth.sign_up("not-an-email", "long-enough", Role::User),
        Err(AuthError::InvalidEmail)
    ));
    assert!(matches!(
        auth.sign_up("short@example.com", "short", Role::User),
        Err(AuthError::WeakPassword { min_chars: 8 })
    ));
}

#[test]
fn sign_out_revokes_token_and_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);
    auth.sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();
    let session = auth.sign_in("owner@example.com", "owner-password").unwrap();

    auth.sign_out(&session.token).unwrap();
    auth.sign_out(&session.token).unwrap();

    assert!(matches!(
        auth.resolve(&session.token),
        Err(AuthError::SessionNotFound)
    ));
}

#[test]
fn expired_session_does_not_resolve() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn).with_session_ttl(Duration::ZERO);
    auth.sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();
    let session = auth.sign_in("owner@example.com", "owner-password").unwrap();

    assert!(matches!(
        auth.resolve(&session.token),
        Err(AuthError::SessionExpired)
    ));
    assert!(matches!(
        auth.resolve(&session.token),
        Err(AuthError::SessionNotFound)
    ));
}

#[test]
fn users_are_listed_by_email() {
    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);
    auth.sign_up("zoe@example.com", "zoe-password", Role::User)
        .unwrap();
    auth.sign_up("adam@example.com", "adam-password", Role::Admin)
        .unwrap();

    let emails: Vec<_> = auth
        .list_users()
        .unwrap()
        .into_iter()
        .map(|user| user.email)
        .collect();
    assert_eq!(emails, vec!["adam@example.com", "zoe@example.com"]);
    assert!(auth
        .find_user_by_email("ZOE@example.com")
        .unwrap()
        .is_some());
}

#[test]
fn stored_password_is_stretched_not_a_single_digest() {
    use sha2::{Digest, Sha256};

    let conn = open_db_in_memory().unwrap();
    let auth = AuthService::new(&conn);
    let user = auth
        .sign_up("owner@example.com", "owner-password", Role::User)
        .unwrap();

    let (hash, salt): (String, String) = conn
        .query_row(
            "SELECT password_hash, password_salt FROM users WHERE id = ?1;",
            [user.id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();

    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(b"owner-password");
    let one_round = hex::encode(hasher.finalize());

    assert!(hash.starts_with("pbkdf2-sha256$600000$"));
    assert!(!hash.contains(&one_round));
    assert!(!hash.contains("owner-password"));
    assert!(auth.sign_in("owner@example.com", "owner-password").is_ok());
}
