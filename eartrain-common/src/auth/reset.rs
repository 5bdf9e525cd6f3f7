//! Password reset tokens
//!
//! The raw token is emailed to the user; only its SHA-256 digest is stored,
//! so a leaked table cannot be used to reset passwords.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Random bytes per token (hex-encoded to 64 characters)
const TOKEN_BYTES: usize = 32;

/// Freshly generated reset token
#[derive(Debug, Clone)]
pub struct ResetToken {
    /// Value sent to the user
    pub raw: String,
    /// Value stored in the database
    pub hash: String,
}

/// Generate a random reset token and its stored digest
pub fn generate_reset_token() -> ResetToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let raw: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    let hash = hash_reset_token(&raw);
    ResetToken { raw, hash }
}

/// SHA-256 digest of a raw token as 64 hex characters
pub fn hash_reset_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}
