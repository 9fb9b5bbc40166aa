// src/auth/passwords.rs
use crate::errors::ServerError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(password: &str, cost: u32) -> Result<String, ServerError> {
    bcrypt::hash(password, cost).map_err(|e| {
        tracing::error!(error = %e, "password hash failed");
        ServerError::InternalError
    })
}

/// False for malformed hashes as well as wrong passwords.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
