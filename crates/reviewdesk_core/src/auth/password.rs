//! Salted, stretched password digests.
//!
//! Stored hashes are self-describing: `pbkdf2-sha256$<iterations>$<hex key>`.
//! Verification derives with the stored iteration count, so the constant can
//! be raised without invalidating existing accounts.

use log::warn;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use uuid::Uuid;

pub(crate) const PBKDF2_ITERATIONS: u32 = 600_000;

const SCHEME: &str = "pbkdf2-sha256";
const KEY_SIZE: usize = 32;

pub(crate) struct PasswordDigest {
    pub hash: String,
    pub salt: String,
}

pub(crate) fn digest_new(password: &str) -> PasswordDigest {
    let salt = hex::encode(Uuid::new_v4().as_bytes());
    let key = derive_key(password, &salt, PBKDF2_ITERATIONS);
    PasswordDigest {
        hash: format!("{SCHEME}${PBKDF2_ITERATIONS}${}", hex::encode(key)),
        salt,
    }
}

pub(crate) fn verify(password: &str, salt: &str, stored_hash: &str) -> bool {
    let Some((iterations, expected)) = parse_stored_hash(stored_hash) else {
        warn!("event=password_verify module=auth status=error error_code=unknown_hash_format");
        return false;
    };
    let actual = derive_key(password, salt, iterations);
    constant_time_eq(&actual, &expected)
}

fn derive_key(password: &str, salt: &str, iterations: u32) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    key
}

fn parse_stored_hash(stored: &str) -> Option<(u32, Vec<u8>)> {
    let mut parts = stored.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().filter(|n| *n > 0)?;
    let key = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || key.len() != KEY_SIZE {
        return None;
    }
    Some((iterations, key))
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
