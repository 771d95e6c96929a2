use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Derives the server-side fingerprint of a signed refresh token.
///
/// Only this value is ever persisted; holding the stored fingerprint is not
/// enough to reconstruct a valid refresh token (the signing secret is still
/// required).
pub fn fingerprint_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Compares two fingerprints in constant time to prevent timing attacks
pub fn fingerprints_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let fp = fingerprint_token("some.signed.token");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        assert_eq!(fingerprint_token("abc"), fingerprint_token("abc"));
        assert_ne!(fingerprint_token("abc"), fingerprint_token("abd"));
    }

    #[test]
    fn test_fingerprints_equal_same() {
        let fp = fingerprint_token("token");
        assert!(fingerprints_equal(&fp, &fp));
    }

    #[test]
    fn test_fingerprints_equal_different() {
        let a = fingerprint_token("token-a");
        let b = fingerprint_token("token-b");
        assert!(!fingerprints_equal(&a, &b));
    }

    #[test]
    fn test_fingerprints_equal_different_lengths() {
        assert!(!fingerprints_equal("short", "much_longer_value"));
    }
}
