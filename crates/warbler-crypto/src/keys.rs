use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

/// Generate a random 256-bit key for signing session tokens.
pub fn generate_session_key() -> [u8; 32] {
    rand::random()
}

/// Encode a key to base64 for display or storage in `.env`.
pub fn key_to_base64(key: &[u8; 32]) -> String {
    BASE64.encode(key)
}

/// Fresh base64 session secret, used when none is configured.
pub fn generate_session_secret() -> String {
    key_to_base64(&generate_session_key())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secrets_differ() {
        let a = generate_session_secret();
        let b = generate_session_secret();
        assert_ne!(a, b);
        assert_eq!(BASE64.decode(&a).unwrap().len(), 32);
    }
}
