//! Stable pseudo-anonymous user identity.
//!
//! The backend buckets users by hashing (experiment, user id), so the id must
//! stay stable across runs on the same machine. The id is derived once from a
//! fingerprint of stable host attributes and then persisted by the store; the
//! fingerprint is only consulted when no persisted id exists.

use sha2::{Digest, Sha256};

/// Length of a derived user id, in hex characters
pub const USER_ID_LEN: usize = 16;

/// Build a fingerprint string from stable host attributes.
///
/// None of these change between runs on the same machine under the same
/// account, which is the stability the assignment partition key needs.
pub fn fingerprint() -> String {
    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown-host".to_string());
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown-user".to_string());
    let home = dirs::home_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();

    [
        hostname,
        user,
        std::env::consts::OS.to_string(),
        std::env::consts::ARCH.to_string(),
        home,
    ]
    .join("|")
}

/// Derive a user id from the host fingerprint
pub fn derive_user_id() -> String {
    hash_fingerprint(&fingerprint())
}

/// Hash a fingerprint string into a short hex id
pub fn hash_fingerprint(fingerprint: &str) -> String {
    let digest = Sha256::digest(fingerprint.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(USER_ID_LEN);
    id
}
