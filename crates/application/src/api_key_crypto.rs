//! API key generation and digest comparison.
//!
//! Keys are 32 random bytes rendered as 64 lowercase hex characters and are
//! persisted only as SHA-256 hex digests.

use std::fmt::Write;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use paygate_core::{AppError, AppResult};
use paygate_domain::ApiKey;

/// Digest compared against when no tenant matched, so that hits and misses
/// perform the same work.
pub(crate) const UNMATCHED_DIGEST: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Generates a fresh random API key.
pub(crate) fn generate_api_key() -> AppResult<ApiKey> {
    let mut bytes = [0u8; 32];
    getrandom::fill(&mut bytes)
        .map_err(|error| AppError::Internal(format!("failed to generate api key: {error}")))?;

    ApiKey::new(to_hex(&bytes))
}

/// Computes the storage digest of a raw API key.
#[must_use]
pub fn digest_api_key(raw_key: &str) -> String {
    to_hex(&Sha256::digest(raw_key.as_bytes()))
}

/// Compares two digests in constant time.
#[must_use]
pub fn digests_match(left: &str, right: &str) -> bool {
    let left = Sha256::digest(left.as_bytes());
    let right = Sha256::digest(right.as_bytes());
    left.ct_eq(&right).into()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_are_64_hex_characters() {
        let key = generate_api_key().unwrap_or_else(|_| unreachable!());
        assert_eq!(key.expose().len(), 64);
        assert!(key.expose().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_keys_differ() {
        let first = generate_api_key().unwrap_or_else(|_| unreachable!());
        let second = generate_api_key().unwrap_or_else(|_| unreachable!());
        assert_ne!(first.expose(), second.expose());
    }

    #[test]
    fn digest_is_case_sensitive() {
        assert_ne!(digest_api_key("ABC"), digest_api_key("abc"));
        assert_eq!(digest_api_key("abc").len(), 64);
    }

    #[test]
    fn digests_match_only_identical_values() {
        let digest = digest_api_key("key");
        assert!(digests_match(&digest, &digest_api_key("key")));
        assert!(!digests_match(&digest, UNMATCHED_DIGEST));
    }
}
