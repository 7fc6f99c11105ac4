//! Credential validation
//!
//! Passwords are stored as `base64(hmac_sha256(key = salt, msg = password))`
//! with a random per-user salt. Verification recomputes the MAC and compares
//! it in constant time.

use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::data::User;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

const SALT_BYTES: usize = 16;

/// Username/password pair supplied with a mutating request
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Stored form of a password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    /// Base64 HMAC-SHA256 digest
    pub hash: String,
    /// Base64 salt
    pub salt: String,
}

/// Hash a password with a freshly generated salt
pub fn hash_password(password: &str) -> Result<PasswordHash, AppError> {
    let mut salt = [0u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut salt);

    let mut mac = HmacSha256::new_from_slice(&salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid salt length: {e}")))?;
    mac.update(password.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(PasswordHash {
        hash: general_purpose::STANDARD.encode(digest),
        salt: general_purpose::STANDARD.encode(salt),
    })
}

/// Check a plaintext password against a user's stored digest
///
/// Returns `false` for malformed stored values rather than erroring.
pub fn verify_password(user: &User, password: &str) -> bool {
    let Ok(salt) = general_purpose::STANDARD.decode(&user.password_salt) else {
        tracing::warn!(user_id = user.id, "Stored password salt is not valid base64");
        return false;
    };
    let Ok(expected) = general_purpose::STANDARD.decode(&user.password_hash) else {
        tracing::warn!(user_id = user.id, "Stored password hash is not valid base64");
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(&salt) else {
        return false;
    };

    mac.update(password.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Authorize an action performed as `user`
///
/// # Errors
/// - `NotFound` when no user matched the supplied username
/// - `NotAuthorized` when the password does not match
pub fn authorize(user: Option<User>, credentials: &Credentials) -> Result<User, AppError> {
    let user = user.ok_or_else(|| AppError::NotFound("No user found".to_string()))?;

    if !verify_password(&user, &credentials.password) {
        tracing::debug!(username = %credentials.username, "Credential check failed");
        return Err(AppError::NotAuthorized(
            "Please provide required credentials".to_string(),
        ));
    }

    Ok(user)
}
