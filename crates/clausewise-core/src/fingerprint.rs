//! Document fingerprinting.

use sha2::{Digest, Sha256};

/// SHA-256 of the document's UTF-8 bytes, as 64 lowercase hex characters.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            fingerprint(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            fingerprint("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_single_character_change() {
        let a = fingerprint("1. The Client shall pay INR 10,000.");
        let b = fingerprint("1. The Client shall pay INR 10,001.");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
