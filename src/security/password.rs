use md5::Md5;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Hash a password to lowercase hex. The unsalted branch is MD5, kept for
/// compatibility with hashes persisted by earlier deployments; salted input
/// is SHA-256 over `password || salt`.
pub fn hash_password(password: &str, salt: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }

    let digest = if salt.is_empty() {
        hex::encode(Md5::digest(password.as_bytes()))
    } else {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        hasher.update(salt.as_bytes());
        hex::encode(hasher.finalize())
    };

    Ok(digest)
}

/// Recompute the hash and compare against the stored one in constant time.
/// Empty password or empty stored hash is never a match.
pub fn verify_password(password: &str, stored_hash: &str, salt: &str) -> bool {
    if password.is_empty() || stored_hash.is_empty() {
        return false;
    }

    match hash_password(password, salt) {
        Ok(computed) => computed.as_bytes().ct_eq(stored_hash.as_bytes()).into(),
        Err(_) => false,
    }
}

/// SHA-256 fingerprint used to index stored refresh tokens. The raw token
/// never touches the database.
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsalted_hash_is_md5_hex() {
        // Well-known digest of the literal "password".
        let hash = hash_password("password", "").unwrap();
        assert_eq!(hash, "5f4dcc3b5aa765d61d8327deb882cf99");
        assert_eq!(hash.len(), 32);
    }

    #[test]
    fn salted_hash_is_sha256_hex() {
        let hash = hash_password("password", "salt").unwrap();
        // sha256("passwordsalt")
        assert_eq!(
            hash,
            "7a37b85c8918eac19a9089c0fa5a2ab4dce3f90528dcdeec108b23ddf3607b99"
        );
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn empty_password_is_rejected() {
        assert_eq!(hash_password("", ""), Err(PasswordError::EmptyPassword));
        assert_eq!(hash_password("", "salt"), Err(PasswordError::EmptyPassword));
    }

    #[test]
    fn verify_round_trips_for_both_branches() {
        for salt in ["", "pepper"] {
            let hash = hash_password("Secret1", salt).unwrap();
            assert!(verify_password("Secret1", &hash, salt));
            assert!(!verify_password("Secret2", &hash, salt));
        }
    }

    #[test]
    fn verify_rejects_empty_inputs() {
        let hash = hash_password("Secret1", "").unwrap();
        assert!(!verify_password("", &hash, ""));
        assert!(!verify_password("Secret1", "", ""));
    }

    #[test]
    fn salt_changes_the_digest() {
        let a = hash_password("Secret1", "a").unwrap();
        let b = hash_password("Secret1", "b").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_sha256_regardless_of_content() {
        let fp = fingerprint("any-token");
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic.
        assert_eq!(fp, fingerprint("any-token"));
        assert_ne!(fp, fingerprint("other-token"));
    }
}
