use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of a password, the form stored in the users table.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Session token issued on login: sha256 over name, password and the login
/// second, so every successful login rotates the token.
pub fn generate_token(name: &str, password: &str, unix_seconds: i64) -> String {
    hex::encode(Sha256::digest(
        format!("{name}:{password}:{unix_seconds}").as_bytes(),
    ))
}
