use argon2::Config;
use rand::Rng;

/// Hash a password or pin for storage.
///
/// 16 bytes of salt is recommended for password hashing:
///  https://en.wikipedia.org/wiki/Argon2
pub fn hash_secret(secret: &str) -> Result<String, argon2::Error> {
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(secret.as_bytes(), &salt, &Config::default())
}

/// Check a plaintext secret against a stored hash. A malformed hash never matches.
pub fn verify_secret(hash: &str, secret: &str) -> bool {
    argon2::verify_encoded(hash, secret.as_bytes()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_secret("4821").unwrap();
        assert!(verify_secret(&hash, "4821"));
        assert!(!verify_secret(&hash, "4822"));
    }

    #[test]
    fn salted() {
        assert_ne!(hash_secret("4821").unwrap(), hash_secret("4821").unwrap());
    }

    #[test]
    fn malformed_hash_never_matches() {
        assert!(!verify_secret("4821", "4821"));
    }
}
