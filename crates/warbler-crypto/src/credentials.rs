use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hash a plaintext password with Argon2id and a fresh random salt.
/// Returns the PHC string that gets stored in place of the password.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?;

    Ok(hash.to_string())
}

/// Check a plaintext password against a stored credential.
/// A credential that is not a PHC string never verifies.
pub fn verify_password(credential: &str, plaintext: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(credential) else {
        return false;
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

static DUMMY: OnceLock<Option<String>> = OnceLock::new();

fn dummy_credential() -> Option<&'static str> {
    DUMMY
        .get_or_init(|| hash_password("warbler-dummy-credential").ok())
        .as_deref()
}

/// Hash the throwaway credential now instead of on the first lookup miss.
/// Call once at startup.
pub fn warm_up() {
    dummy_credential();
}

/// Run a full verification against a throwaway credential, so a lookup
/// miss costs as much as a wrong password. Always returns false.
pub fn verify_against_dummy(plaintext: &str) -> bool {
    if let Some(credential) = dummy_credential() {
        let _ = verify_password(credential, plaintext);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let credential = hash_password("PASSWORD").unwrap();
        assert_ne!(credential, "PASSWORD");
        assert!(credential.starts_with("$argon2id$"));

        assert!(verify_password(&credential, "PASSWORD"));
        assert!(!verify_password(&credential, "password"));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("hunter22").unwrap();
        let b = hash_password("hunter22").unwrap();
        assert_ne!(a, b);
        assert!(verify_password(&a, "hunter22"));
        assert!(verify_password(&b, "hunter22"));
    }

    #[test]
    fn malformed_credential_never_verifies() {
        assert!(!verify_password("HASHED_PASSWORD", "HASHED_PASSWORD"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn warm_up_prepares_the_dummy_credential() {
        warm_up();
        let credential = DUMMY.get().and_then(|c| c.as_deref()).unwrap();
        assert!(credential.starts_with("$argon2id$"));
    }

    #[test]
    fn dummy_verification_always_fails() {
        assert!(!verify_against_dummy("warbler-dummy-credential"));
        assert!(!verify_against_dummy("anything"));
    }
}
