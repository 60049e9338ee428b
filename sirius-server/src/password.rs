use argon2::{Argon2, Params};
use base64::{prelude::BASE64_STANDARD, Engine};
use thiserror::Error;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = Params::DEFAULT_OUTPUT_LEN;

/// Stored form: `base64(salt)$base64(hash)`
const SEPARATOR: char = '$';

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("Hashing password failed: {0}")]
pub struct PasswordHashError(argon2::Error);

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordHashError> {
    let salt: [u8; SALT_LEN] = rand::random();
    let hash = hash_with_salt(password, &salt)?;
    Ok(format!(
        "{}{}{}",
        BASE64_STANDARD.encode(salt),
        SEPARATOR,
        BASE64_STANDARD.encode(hash)
    ))
}

/// Check a password against a stored `salt$hash` string.
/// Malformed stored values verify as false rather than erroring, so a
/// corrupted row can never be logged into.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_part, hash_part)) = stored.split_once(SEPARATOR) else {
        return false;
    };
    let Ok(salt) = BASE64_STANDARD.decode(salt_part) else {
        return false;
    };
    let Ok(expected) = BASE64_STANDARD.decode(hash_part) else {
        return false;
    };
    let Ok(computed) = hash_with_salt(password, &salt) else {
        return false;
    };

    // Fixed-length comparison over the full hash
    expected.len() == computed.len()
        && expected
            .iter()
            .zip(computed.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn hash_with_salt(password: &str, salt: &[u8]) -> Result<[u8; HASH_LEN], PasswordHashError> {
    let mut hash = [0u8; HASH_LEN];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut hash)
        .map_err(PasswordHashError)?;
    Ok(hash)
}
